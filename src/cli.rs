//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure accepted by `build-scenario`.
//! Cache location and lock timeout fall back to the environment variables
//! named in [`scenario_env`].

use camino::Utf8PathBuf;
use clap::Parser;
use scenario_env::{CACHE_DIR_ENV, DEFAULT_CACHE_DIR, DEFAULT_LOCK_TIMEOUT_SECS, LOCK_TIMEOUT_ENV};
use std::time::Duration;

/// Maximum lock timeout accepted by the CLI, in seconds.
const MAX_LOCK_TIMEOUT_SECS: u64 = 3600;

fn parse_lock_timeout(s: &str) -> Result<Duration, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number of seconds"))?;
    if (1..=MAX_LOCK_TIMEOUT_SECS).contains(&value) {
        Ok(Duration::from_secs(value))
    } else {
        Err(format!(
            "lock timeout must be between 1 and {MAX_LOCK_TIMEOUT_SECS} seconds"
        ))
    }
}

/// Build a database fixture scenario, reusing cached snapshots when possible.
#[derive(Debug, Parser)]
#[command(name = "build-scenario", author, version, about, long_about = None)]
pub struct Cli {
    /// Scenario to build.
    #[arg(short, long, value_name = "SCENARIO", required_unless_present = "list")]
    pub name: Option<String>,

    /// Discard cached snapshots for the whole chain and reseed it.
    #[arg(long)]
    pub force: bool,

    /// Scenario catalog to load.
    #[arg(short, long, value_name = "FILE", default_value = "scenarios.yml")]
    pub catalog: Utf8PathBuf,

    /// Directory holding snapshot and lock files.
    #[arg(long, value_name = "DIR", env = CACHE_DIR_ENV, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: Utf8PathBuf,

    /// Seconds to wait for another process's snapshot lock.
    ///
    /// Values must be between 1 and 3600.
    #[arg(
        long,
        value_name = "SECS",
        env = LOCK_TIMEOUT_ENV,
        default_value = DEFAULT_LOCK_TIMEOUT_SECS,
        value_parser = parse_lock_timeout
    )]
    pub lock_timeout: Duration,

    /// Write the resulting tables as JSON to this path (`-` for stdout).
    #[arg(long, value_name = "FILE")]
    pub emit: Option<Utf8PathBuf>,

    /// Print the resolved plan without touching the cache or database.
    #[arg(long, conflicts_with_all = ["force", "emit"])]
    pub dry_run: bool,

    /// List the scenarios in the catalog and exit.
    #[arg(long, conflicts_with_all = ["name", "force", "emit", "dry_run"])]
    pub list: bool,

    /// Force accessible output mode on or off (overrides auto-detection).
    #[arg(long)]
    pub accessible: Option<bool>,

    /// Force standard progress output on or off.
    #[arg(long)]
    pub progress: Option<bool>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,
}
