//! Error taxonomy for scenario registration, resolution, and execution.
//!
//! Resolution-phase variants are raised before any database mutation. Seed
//! failures roll back only the descriptor in flight. Corrupt snapshots are
//! normally recovered by the executor as cache misses and rarely reach callers.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

use crate::scenario::ScenarioName;

/// Boxed cause carried by failures that originate in external collaborators.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit code reported by the driver for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code reported for seed, resolution, and other failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code reported when the preload graph contains a cycle.
pub const EXIT_CYCLE: u8 = 2;

/// Errors raised while building or restoring scenarios.
#[derive(Debug, Error, Diagnostic)]
pub enum ScenarioError {
    /// A scenario name was registered twice.
    #[error("scenario '{name}' is already registered")]
    #[diagnostic(
        code(scenarist::registry::duplicate),
        help("scenario names must be unique within a registry")
    )]
    DuplicateScenario {
        /// The conflicting name.
        name: ScenarioName,
    },

    /// A name was looked up or referenced without being registered.
    #[error("{}", unknown_message(.name, .referenced_by.as_ref()))]
    #[diagnostic(code(scenarist::registry::unknown))]
    UnknownScenario {
        /// The missing name.
        name: String,
        /// Scenario whose `preload` named the missing scenario, if any.
        referenced_by: Option<ScenarioName>,
    },

    /// A string is not usable as a scenario name.
    #[error("invalid scenario name '{name}': {reason}")]
    #[diagnostic(code(scenarist::registry::invalid_name))]
    InvalidName {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The preload chain of a scenario loops back on itself.
    #[error("preload cycle detected: {}", .cycle.iter().join(" -> "))]
    #[diagnostic(
        code(scenarist::resolve::cycle),
        help("remove one of the preload references so the chain terminates")
    )]
    CycleDetected {
        /// Scenarios forming the cycle; the first name is repeated at the end.
        cycle: Vec<ScenarioName>,
    },

    /// A seed operation failed and its transaction was rolled back.
    #[error("seeding scenario '{scenario}' failed")]
    #[diagnostic(code(scenarist::execute::seed_failure))]
    SeedFailure {
        /// Scenario whose seed failed.
        scenario: ScenarioName,
        /// Underlying cause reported by the seed.
        #[source]
        source: BoxedCause,
    },

    /// A snapshot file could not be trusted.
    #[error("snapshot for '{scenario}' at {path} is corrupt: {reason}")]
    #[diagnostic(code(scenarist::snapshot::corrupt))]
    CorruptSnapshot {
        /// Scenario the snapshot belongs to.
        scenario: ScenarioName,
        /// Location of the snapshot file.
        path: Utf8PathBuf,
        /// What failed validation.
        reason: String,
    },

    /// The per-scenario snapshot lock could not be acquired in time.
    #[error("timed out after {}s waiting for the snapshot lock of '{scenario}'", .waited.as_secs())]
    #[diagnostic(
        code(scenarist::snapshot::lock_timeout),
        help("another process may be building the same scenario; retry or raise --lock-timeout")
    )]
    LockTimeout {
        /// Scenario whose lock was contended.
        scenario: ScenarioName,
        /// How long acquisition was attempted.
        waited: Duration,
    },

    /// Reading or writing the snapshot cache failed.
    #[error("snapshot cache I/O failed at {path}")]
    #[diagnostic(code(scenarist::snapshot::io))]
    SnapshotIo {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The unit of work failed outside a seed operation.
    #[error("database {operation} failed")]
    #[diagnostic(code(scenarist::database))]
    Database {
        /// Operation being performed, such as `commit` or `restore`.
        operation: &'static str,
        /// Underlying cause reported by the unit of work.
        #[source]
        source: BoxedCause,
    },

    /// The run was cancelled; any in-flight transaction was rolled back.
    #[error("run cancelled while building '{scenario}'")]
    #[diagnostic(code(scenarist::execute::cancelled))]
    Cancelled {
        /// Scenario being processed when cancellation was observed.
        scenario: ScenarioName,
    },

    /// A scenario catalog could not be read or parsed.
    #[error("failed to load scenario catalog {path}: {message}")]
    #[diagnostic(code(scenarist::catalog))]
    Catalog {
        /// Catalog file path.
        path: Utf8PathBuf,
        /// Description of the problem.
        message: String,
    },
}

impl ScenarioError {
    /// Exit code the driver reports for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenarist::error::{ScenarioError, EXIT_FAILURE};
    ///
    /// let err = ScenarioError::UnknownScenario { name: "Users".into(), referenced_by: None };
    /// assert_eq!(err.exit_code(), EXIT_FAILURE);
    /// ```
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::CycleDetected { .. } => EXIT_CYCLE,
            _ => EXIT_FAILURE,
        }
    }

    pub(crate) fn database(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Database {
            operation,
            source: source.into(),
        }
    }
}

fn unknown_message(name: &str, referenced_by: Option<&ScenarioName>) -> String {
    match referenced_by {
        Some(owner) => format!("scenario '{owner}' preloads unknown scenario '{name}'"),
        None => format!("unknown scenario '{name}'"),
    }
}
