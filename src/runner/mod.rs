//! CLI execution for the `build-scenario` driver.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the catalog, dispatches `--list` and `--dry-run`, and otherwise runs
//! the executor against an in-memory database with Ctrl-C wired to
//! cancellation.

mod output;
mod reporting;

pub use output::{is_stdout_path, write_output};
pub use reporting::{OutputMode, make_reporter, resolve_mode, resolve_mode_with};

use anyhow::{Context, Result, anyhow};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::cli::Cli;
use crate::db::MemoryDatabase;
use crate::executor::ScenarioExecutor;
use crate::plan::{ExecutionPlan, Resolver};
use crate::registry::ScenarioRegistry;
use crate::snapshot::SnapshotStore;

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns the [`crate::error::ScenarioError`] raised by catalog loading,
/// resolution, or execution, wrapped in [`anyhow::Error`], plus any failure to
/// write requested output.
pub async fn run(cli: &Cli) -> Result<()> {
    let registry = catalog::from_path(&cli.catalog)?;
    if cli.list {
        return output::write_stdout(render_listing(&registry).as_bytes());
    }
    let target = cli
        .name
        .as_deref()
        .ok_or_else(|| anyhow!("a scenario name is required"))?;
    if cli.dry_run {
        let plan = Resolver::new(&registry).resolve(target)?;
        return output::write_stdout(render_plan(&plan).as_bytes());
    }

    let store = SnapshotStore::open(cli.cache_dir.clone(), cli.lock_timeout)?;
    let reporter = make_reporter(resolve_mode(cli.accessible), cli.progress);
    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());

    let mut db = MemoryDatabase::new();
    let executor = ScenarioExecutor::new(&registry, &store, reporter.as_ref());
    let outcome = executor
        .run_with_cancel(&mut db, target, cli.force, &cancel)
        .await;
    interrupt.abort();
    let report = outcome?;
    info!(
        scenario = %report.target,
        seeded = report.seeded().count(),
        steps = report.steps.len(),
        "scenario built"
    );

    if let Some(path) = &cli.emit {
        let mut json =
            serde_json::to_vec_pretty(db.view()).context("serialise resulting tables")?;
        json.push(b'\n');
        write_output(path, &json)?;
    }
    Ok(())
}

fn spawn_interrupt_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received; cancelling run");
                cancel.cancel();
            }
            Err(err) => debug!(error = %err, "could not install Ctrl-C handler"),
        }
    })
}

fn render_listing<D>(registry: &ScenarioRegistry<D>) -> String {
    registry
        .iter()
        .map(|descriptor| match descriptor.preload() {
            Some(preload) => format!("{} (preloads {preload})\n", descriptor.name()),
            None => format!("{}\n", descriptor.name()),
        })
        .collect()
}

fn render_plan<D>(plan: &ExecutionPlan<D>) -> String {
    plan.names()
        .zip(plan.fingerprints())
        .enumerate()
        .map(|(idx, (name, fingerprint))| {
            let short = fingerprint.get(..12).unwrap_or(&fingerprint);
            format!("{}. {name} [{short}]\n", idx + 1)
        })
        .collect()
}
