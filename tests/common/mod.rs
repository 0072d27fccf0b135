//! Shared helpers for integration tests.
//!
//! Integration tests under `tests/` compile as independent crates. This module
//! is included via `mod common;` in individual test files to share fixtures and
//! helpers while keeping test modules small and avoiding duplication.

use anyhow::{Context, Result};
use assert_cmd::Command;
use scenario_env::{CACHE_DIR_ENV, LOCK_TIMEOUT_ENV};
use test_support::ScenarioWorkspace;

/// `build-scenario` running inside `workspace` with a clean environment.
pub fn driver(workspace: &ScenarioWorkspace) -> Result<Command> {
    let mut cmd = Command::cargo_bin("build-scenario").context("locate build-scenario binary")?;
    cmd.current_dir(workspace.root())
        .env_remove(CACHE_DIR_ENV)
        .env_remove(LOCK_TIMEOUT_ENV);
    Ok(cmd)
}

/// Like [`driver`] with status output silenced.
pub fn build_scenario(workspace: &ScenarioWorkspace) -> Result<Command> {
    let mut cmd = driver(workspace)?;
    cmd.args(["--progress", "false"]);
    Ok(cmd)
}

/// Run `build-scenario --name <scenario> --emit -` and return stdout.
pub fn emit_tables(workspace: &ScenarioWorkspace, scenario: &str) -> Result<String> {
    let output = build_scenario(workspace)?
        .args(["--name", scenario, "--emit", "-"])
        .output()
        .with_context(|| format!("run build-scenario for {scenario}"))?;
    anyhow::ensure!(
        output.status.success(),
        "build-scenario {scenario} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).context("stdout is not UTF-8")
}
