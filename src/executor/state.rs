//! Per-scenario lifecycle states and the run report.

use std::fmt;

use crate::scenario::ScenarioName;

/// Lifecycle of one descriptor during a run.
///
/// ```text
/// Pending -> Resolving -> CacheHit -> Cached
///                      -> Seeding  -> Committed  -> Cached
///                                  -> RolledBack -> Failed
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScenarioState {
    /// Not yet considered.
    Pending,
    /// Part of a resolved plan, awaiting a cache decision.
    Resolving,
    /// A valid snapshot covers this descriptor.
    CacheHit,
    /// The seed is running inside a transaction.
    Seeding,
    /// The seed's transaction committed.
    Committed,
    /// The seed failed or was cancelled and its transaction was discarded.
    RolledBack,
    /// The descriptor's data is present and snapshotted.
    Cached,
    /// The descriptor could not be built.
    Failed,
}

impl ScenarioState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cached | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Resolving)
                | (Self::Resolving, Self::CacheHit | Self::Seeding)
                | (Self::CacheHit | Self::Committed, Self::Cached)
                | (Self::Seeding, Self::Committed | Self::RolledBack)
                | (Self::RolledBack, Self::Failed)
        )
    }

    /// Short lowercase label used in status output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::CacheHit => "cache hit",
            Self::Seeding => "seeding",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
            Self::Cached => "cached",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a descriptor's data came to be present after a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Its own snapshot was restored.
    Restored,
    /// A descendant's snapshot, which includes its rows, was restored.
    Covered,
    /// Its seed ran and a fresh snapshot was written.
    Seeded,
}

/// Final state of one plan step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Descriptor name.
    pub name: ScenarioName,
    /// Terminal state reached.
    pub state: ScenarioState,
    /// How the data was obtained.
    pub outcome: StepOutcome,
}

/// Summary of a successful run, ancestor first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionReport {
    /// The scenario that was requested.
    pub target: ScenarioName,
    /// One entry per plan step.
    pub steps: Vec<StepReport>,
}

impl ExecutionReport {
    /// Names of the descriptors whose seeds ran.
    pub fn seeded(&self) -> impl Iterator<Item = &ScenarioName> {
        self.with_outcome(StepOutcome::Seeded)
    }

    /// Names of the descriptors whose own snapshot was restored.
    pub fn restored(&self) -> impl Iterator<Item = &ScenarioName> {
        self.with_outcome(StepOutcome::Restored)
    }

    fn with_outcome(&self, outcome: StepOutcome) -> impl Iterator<Item = &ScenarioName> {
        self.steps
            .iter()
            .filter(move |step| step.outcome == outcome)
            .map(|step| &step.name)
    }
}
