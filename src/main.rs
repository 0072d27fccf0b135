//! Application entry point.
//!
//! Parses command-line arguments, delegates execution to [`runner::run`], and
//! maps failures onto the driver's exit codes.

use clap::Parser;
use scenarist::error::{EXIT_FAILURE, EXIT_SUCCESS, ScenarioError};
use scenarist::{cli::Cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            };
            drop(err.print());
            return ExitCode::from(code);
        }
    };
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt()
        .with_writer(io::stderr)
        .with_max_level(max_level)
        .init();
    match runner::run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "build-scenario failed");
            let exit = match err.downcast::<ScenarioError>() {
                Ok(scenario_err) => {
                    let code = scenario_err.exit_code();
                    let report = miette::Report::new(scenario_err);
                    drop(writeln!(io::stderr(), "{report:?}"));
                    code
                }
                Err(other) => {
                    drop(writeln!(io::stderr(), "Error: {other:#}"));
                    EXIT_FAILURE
                }
            };
            ExitCode::from(exit)
        }
    }
}
