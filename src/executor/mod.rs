//! Scenario execution: cache restore, transactional seeding, and capture.
//!
//! [`ScenarioExecutor::run`] resolves the target into an ancestor-first plan,
//! restores the deepest snapshot whose fingerprint still matches, and seeds
//! every remaining step inside its own transaction. Each freshly committed step
//! is captured and saved while its snapshot lock is held, so concurrent
//! processes building the same scenario serialise on the write and reuse each
//! other's work.

mod state;

pub use state::{ExecutionReport, ScenarioState, StepOutcome, StepReport};

use camino::Utf8Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db::{DataSet, UnitOfWork};
use crate::error::ScenarioError;
use crate::plan::{ExecutionPlan, Resolver};
use crate::registry::ScenarioRegistry;
use crate::scenario::{ScenarioDescriptor, ScenarioName};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::status::StatusReporter;

/// Drives plans against a unit of work and a snapshot cache.
pub struct ScenarioExecutor<'a, D> {
    resolver: Resolver<'a, D>,
    store: &'a SnapshotStore,
    reporter: &'a dyn StatusReporter,
}

impl<'a, D: UnitOfWork> ScenarioExecutor<'a, D> {
    /// Create an executor over `registry`, caching in `store`.
    #[must_use]
    pub fn new(
        registry: &'a ScenarioRegistry<D>,
        store: &'a SnapshotStore,
        reporter: &'a dyn StatusReporter,
    ) -> Self {
        Self {
            resolver: Resolver::new(registry),
            store,
            reporter,
        }
    }

    /// Resolve `target` without touching the database or the cache.
    ///
    /// # Errors
    ///
    /// Returns the resolver's [`ScenarioError::UnknownScenario`] or
    /// [`ScenarioError::CycleDetected`].
    pub fn plan(&self, target: &str) -> Result<ExecutionPlan<D>, ScenarioError> {
        self.resolver.resolve(target)
    }

    /// Build `target` into `db`.
    ///
    /// # Errors
    ///
    /// See [`ScenarioExecutor::run_with_cancel`].
    pub async fn run(
        &self,
        db: &mut D,
        target: &str,
        force_rebuild: bool,
    ) -> Result<ExecutionReport, ScenarioError> {
        self.run_with_cancel(db, target, force_rebuild, &CancellationToken::new())
            .await
    }

    /// Build `target` into `db`, stopping early when `cancel` fires.
    ///
    /// With `force_rebuild` every snapshot in the plan is discarded first and
    /// the whole chain is reseeded.
    ///
    /// # Errors
    ///
    /// Resolution failures are returned before `db` is touched. A failing seed
    /// is rolled back and reported as [`ScenarioError::SeedFailure`]; no later
    /// step runs. Cancellation rolls back any open transaction and returns
    /// [`ScenarioError::Cancelled`]. Cache and unit-of-work failures surface as
    /// [`ScenarioError::LockTimeout`], [`ScenarioError::SnapshotIo`], or
    /// [`ScenarioError::Database`].
    pub async fn run_with_cancel(
        &self,
        db: &mut D,
        target: &str,
        force_rebuild: bool,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, ScenarioError> {
        let plan = self.resolver.resolve(target)?;
        let target_name = plan
            .target()
            .cloned()
            .ok_or_else(|| ScenarioError::UnknownScenario {
                name: target.to_owned(),
                referenced_by: None,
            })?;
        let fingerprints = plan.fingerprints();
        let mut ctx = ExecutionContext::new(db, self.store.root(), cancel, self.reporter, &plan);
        ctx.check_cancelled(&target_name)?;
        for idx in 0..plan.len() {
            ctx.transition(idx, ScenarioState::Resolving);
        }

        if force_rebuild {
            for name in plan.names() {
                self.store.invalidate(name)?;
            }
        }
        let restorable = if force_rebuild {
            None
        } else {
            self.deepest_snapshot(&plan, &fingerprints)?
        };
        let start = match restorable {
            Some((deepest, snapshot)) => {
                ctx.restore(&snapshot.data).await?;
                for idx in 0..=deepest {
                    let outcome = if idx == deepest {
                        StepOutcome::Restored
                    } else {
                        StepOutcome::Covered
                    };
                    ctx.mark_cached(idx, outcome);
                }
                deepest + 1
            }
            None => {
                debug!(scenario = %target_name, "no reusable snapshot; resetting database");
                ctx.db
                    .reset()
                    .await
                    .map_err(|err| ScenarioError::database("reset", err))?;
                0
            }
        };

        for (idx, (step, fingerprint)) in plan
            .steps()
            .iter()
            .zip(&fingerprints)
            .enumerate()
            .skip(start)
        {
            self.build_step(&mut ctx, idx, step, fingerprint, force_rebuild)
                .await?;
        }

        let report = ctx.into_report(target_name);
        self.reporter.report_complete(&report);
        Ok(report)
    }

    fn deepest_snapshot(
        &self,
        plan: &ExecutionPlan<D>,
        fingerprints: &[String],
    ) -> Result<Option<(usize, Snapshot)>, ScenarioError> {
        for (idx, (step, fingerprint)) in plan.steps().iter().zip(fingerprints).enumerate().rev() {
            if let Some(snapshot) = self.valid_snapshot(step.name(), fingerprint)? {
                return Ok(Some((idx, snapshot)));
            }
        }
        Ok(None)
    }

    /// Load the snapshot for `name` when it was produced by this exact plan.
    fn valid_snapshot(
        &self,
        name: &ScenarioName,
        fingerprint: &str,
    ) -> Result<Option<Snapshot>, ScenarioError> {
        match self.store.load(name) {
            Ok(Some(snapshot)) if snapshot.fingerprint == fingerprint => {
                debug!(scenario = %name, "snapshot matches plan");
                Ok(Some(snapshot))
            }
            Ok(Some(snapshot)) => {
                debug!(
                    scenario = %name,
                    stored = %snapshot.fingerprint,
                    expected = fingerprint,
                    "snapshot is stale"
                );
                Ok(None)
            }
            Ok(None) => Ok(None),
            Err(err @ ScenarioError::CorruptSnapshot { .. }) => {
                warn!(scenario = %name, error = %err, "ignoring corrupt snapshot");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn build_step(
        &self,
        ctx: &mut ExecutionContext<'_, D>,
        idx: usize,
        step: &ScenarioDescriptor<D>,
        fingerprint: &str,
        force_rebuild: bool,
    ) -> Result<(), ScenarioError> {
        let name = step.name();
        ctx.check_cancelled(name)?;
        let cancel = ctx.cancel;
        let _lock = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(ScenarioError::Cancelled { scenario: name.clone() });
            }
            lock = self.store.lock(name) => lock?,
        };

        // Another process may have finished this step while we waited. A forced
        // rebuild reseeds regardless.
        if !force_rebuild
            && let Some(snapshot) = self.valid_snapshot(name, fingerprint)?
        {
            info!(scenario = %name, "reusing snapshot written while waiting for lock");
            ctx.restore(&snapshot.data).await?;
            ctx.mark_cached(idx, StepOutcome::Restored);
            return Ok(());
        }

        ctx.transition(idx, ScenarioState::Seeding);
        info!(scenario = %name, "seeding");
        if let Err(err) = ctx.db.begin_transaction().await {
            ctx.discard(idx).await;
            return Err(ScenarioError::database("begin transaction", err));
        }
        let interruption = {
            let db = &mut *ctx.db;
            tokio::select! {
                biased;
                () = cancel.cancelled() => Some(Interruption::Cancelled),
                result = step.seed().seed(db) => result.err().map(Interruption::Failed),
            }
        };
        if let Some(interruption) = interruption {
            ctx.discard(idx).await;
            return Err(match interruption {
                Interruption::Cancelled => {
                    info!(scenario = %name, "cancelled during seed");
                    ScenarioError::Cancelled {
                        scenario: name.clone(),
                    }
                }
                Interruption::Failed(source) => ScenarioError::SeedFailure {
                    scenario: name.clone(),
                    source: source.into(),
                },
            });
        }
        if let Err(err) = ctx.db.commit().await {
            ctx.discard(idx).await;
            return Err(ScenarioError::database("commit", err));
        }
        ctx.transition(idx, ScenarioState::Committed);

        let data = ctx
            .db
            .capture()
            .await
            .map_err(|err| ScenarioError::database("capture", err))?;
        self.store
            .save(&Snapshot::new(name.clone(), fingerprint.to_owned(), data))?;
        ctx.transition(idx, ScenarioState::Cached);
        ctx.set_outcome(idx, StepOutcome::Seeded);
        Ok(())
    }
}

enum Interruption {
    Cancelled,
    Failed(anyhow::Error),
}

struct TrackedStep {
    name: ScenarioName,
    state: ScenarioState,
    outcome: Option<StepOutcome>,
}

/// State scoped to a single run.
struct ExecutionContext<'c, D> {
    db: &'c mut D,
    cache_dir: &'c Utf8Path,
    cancel: &'c CancellationToken,
    reporter: &'c dyn StatusReporter,
    steps: Vec<TrackedStep>,
}

impl<'c, D: UnitOfWork> ExecutionContext<'c, D> {
    fn new(
        db: &'c mut D,
        cache_dir: &'c Utf8Path,
        cancel: &'c CancellationToken,
        reporter: &'c dyn StatusReporter,
        plan: &ExecutionPlan<D>,
    ) -> Self {
        let steps: Vec<TrackedStep> = plan
            .names()
            .map(|name| TrackedStep {
                name: name.clone(),
                state: ScenarioState::Pending,
                outcome: None,
            })
            .collect();
        let names: Vec<ScenarioName> = steps.iter().map(|step| step.name.clone()).collect();
        reporter.report_plan(&names);
        Self {
            db,
            cache_dir,
            cancel,
            reporter,
            steps,
        }
    }

    fn check_cancelled(&self, scenario: &ScenarioName) -> Result<(), ScenarioError> {
        if self.cancel.is_cancelled() {
            info!(scenario = %scenario, "run cancelled");
            return Err(ScenarioError::Cancelled {
                scenario: scenario.clone(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, idx: usize, next: ScenarioState) {
        let Some(step) = self.steps.get_mut(idx) else {
            return;
        };
        debug_assert!(
            step.state.can_transition_to(next),
            "illegal transition {} -> {next} for {}",
            step.state,
            step.name
        );
        step.state = next;
        self.reporter.report_transition(&step.name, next);
    }

    fn set_outcome(&mut self, idx: usize, outcome: StepOutcome) {
        if let Some(step) = self.steps.get_mut(idx) {
            step.outcome = Some(outcome);
        }
    }

    fn mark_cached(&mut self, idx: usize, outcome: StepOutcome) {
        self.transition(idx, ScenarioState::CacheHit);
        self.transition(idx, ScenarioState::Cached);
        self.set_outcome(idx, outcome);
    }

    async fn restore(&mut self, data: &DataSet) -> Result<(), ScenarioError> {
        debug!(cache = %self.cache_dir, tables = data.len(), "restoring snapshot");
        self.db
            .restore(data)
            .await
            .map_err(|err| ScenarioError::database("restore", err))
    }

    /// Roll back the open transaction, if any, and mark the step failed.
    async fn discard(&mut self, idx: usize) {
        if self.db.is_active_transaction()
            && let Err(err) = self.db.rollback().await
        {
            warn!(error = %err, "rollback failed");
        }
        self.transition(idx, ScenarioState::RolledBack);
        self.transition(idx, ScenarioState::Failed);
    }

    fn into_report(self, target: ScenarioName) -> ExecutionReport {
        let steps = self
            .steps
            .into_iter()
            .filter_map(|step| {
                step.outcome.map(|outcome| StepReport {
                    name: step.name,
                    state: step.state,
                    outcome,
                })
            })
            .collect();
        ExecutionReport { target, steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::scenario::Seed;
    use crate::status::SilentReporter;
    use async_trait::async_trait;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::borrow::Cow;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    type SeedLog = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Clone)]
    enum Behaviour {
        Insert,
        FailAfterInsert,
        CancelAfterInsert(CancellationToken),
    }

    struct InsertRow {
        scenario: &'static str,
        table: &'static str,
        revision: &'static str,
        behaviour: Behaviour,
        log: SeedLog,
    }

    #[async_trait]
    impl Seed<MemoryDatabase> for InsertRow {
        async fn seed(&self, db: &mut MemoryDatabase) -> anyhow::Result<()> {
            self.log.lock().expect("log lock").push(self.scenario);
            db.insert(self.table, [("id", json!(1)), ("owner", json!(self.scenario))])?;
            match &self.behaviour {
                Behaviour::Insert => Ok(()),
                Behaviour::FailAfterInsert => anyhow::bail!("constraint violated"),
                Behaviour::CancelAfterInsert(token) => {
                    token.cancel();
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }

        fn revision(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.revision)
        }
    }

    struct Harness {
        _temp: TempDir,
        store: SnapshotStore,
        log: SeedLog,
    }

    impl Harness {
        fn seeded(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.log.lock().expect("log lock"))
        }

        fn chain(&self, roles_revision: &'static str, users: Behaviour) -> ScenarioRegistry<MemoryDatabase> {
            let step = |scenario, table, revision, behaviour| InsertRow {
                scenario,
                table,
                revision,
                behaviour,
                log: Arc::clone(&self.log),
            };
            let mut builder = ScenarioRegistry::builder();
            builder
                .register(
                    ScenarioDescriptor::new("Sandbox", step("Sandbox", "tenants", "1", Behaviour::Insert))
                        .expect("sandbox"),
                )
                .expect("register sandbox");
            builder
                .register(
                    ScenarioDescriptor::new("Roles", step("Roles", "roles", roles_revision, Behaviour::Insert))
                        .and_then(|d| d.preloads("Sandbox"))
                        .expect("roles"),
                )
                .expect("register roles");
            builder
                .register(
                    ScenarioDescriptor::new("Users", step("Users", "users", "1", users))
                        .and_then(|d| d.preloads("Roles"))
                        .expect("users"),
                )
                .expect("register users");
            builder.build().expect("registry")
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().join("cache")).expect("utf8 path");
        let store = SnapshotStore::open(root, Duration::from_millis(100)).expect("store");
        Harness {
            _temp: temp,
            store,
            log: Arc::default(),
        }
    }

    fn names<'a>(iter: impl Iterator<Item = &'a ScenarioName>) -> Vec<String> {
        iter.map(ToString::to_string).collect()
    }

    async fn build(
        harness: &Harness,
        registry: &ScenarioRegistry<MemoryDatabase>,
        db: &mut MemoryDatabase,
        target: &str,
        force: bool,
    ) -> Result<ExecutionReport, ScenarioError> {
        ScenarioExecutor::new(registry, &harness.store, &SilentReporter)
            .run(db, target, force)
            .await
    }

    #[rstest]
    #[tokio::test]
    async fn first_run_seeds_chain_in_order(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let mut db = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut db, "Users", false)
            .await
            .expect("run");

        assert_eq!(harness.seeded(), ["Sandbox", "Roles", "Users"]);
        assert_eq!(names(report.seeded()), ["Sandbox", "Roles", "Users"]);
        assert!(report.steps.iter().all(|step| step.state == ScenarioState::Cached));
        for table in ["tenants", "roles", "users"] {
            assert_eq!(db.row_count(table), 1, "{table}");
        }
        for scenario in ["Sandbox", "Roles", "Users"] {
            let name = ScenarioName::new(scenario).expect("name");
            assert!(harness.store.path_for(&name).exists(), "{scenario} snapshot");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn second_run_restores_identical_data(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let mut first = MemoryDatabase::new();
        build(&harness, &registry, &mut first, "Users", false)
            .await
            .expect("first run");
        harness.seeded();

        let mut second = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut second, "Users", false)
            .await
            .expect("second run");

        assert!(harness.seeded().is_empty());
        assert_eq!(names(report.restored()), ["Users"]);
        assert_eq!(second.view(), first.view());
    }

    #[rstest]
    #[tokio::test]
    async fn cached_ancestor_seeds_only_dependent(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        build(&harness, &registry, &mut MemoryDatabase::new(), "Roles", false)
            .await
            .expect("roles");
        assert_eq!(harness.seeded(), ["Sandbox", "Roles"]);

        let mut db = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut db, "Users", false)
            .await
            .expect("users");

        assert_eq!(harness.seeded(), ["Users"]);
        assert_eq!(names(report.restored()), ["Roles"]);
        let outcomes: Vec<StepOutcome> = report.steps.iter().map(|step| step.outcome).collect();
        assert_eq!(
            outcomes,
            [StepOutcome::Covered, StepOutcome::Restored, StepOutcome::Seeded]
        );
        assert_eq!(db.row_count("roles"), 1);
        assert_eq!(db.row_count("users"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failing_seed_rolls_back_and_writes_no_snapshot(harness: Harness) {
        let registry = harness.chain("1", Behaviour::FailAfterInsert);
        let mut db = MemoryDatabase::new();
        let err = build(&harness, &registry, &mut db, "Users", false)
            .await
            .expect_err("users seed fails");

        assert!(
            matches!(&err, ScenarioError::SeedFailure { scenario, .. } if scenario.as_str() == "Users"),
            "{err:?}"
        );
        assert!(!db.is_active_transaction());
        assert_eq!(db.row_count("users"), 0);
        assert_eq!(db.row_count("roles"), 1);
        let users = ScenarioName::new("Users").expect("name");
        let roles = ScenarioName::new("Roles").expect("name");
        assert!(!harness.store.path_for(&users).exists());
        assert!(harness.store.path_for(&roles).exists());
    }

    #[rstest]
    #[tokio::test]
    async fn force_rebuild_reseeds_every_step(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        build(&harness, &registry, &mut MemoryDatabase::new(), "Users", false)
            .await
            .expect("first run");
        harness.seeded();

        let mut db = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut db, "Users", true)
            .await
            .expect("forced run");
        assert_eq!(harness.seeded(), ["Sandbox", "Roles", "Users"]);
        assert_eq!(report.restored().count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_snapshot_is_treated_as_miss(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        build(&harness, &registry, &mut MemoryDatabase::new(), "Users", false)
            .await
            .expect("first run");
        harness.seeded();
        let users = ScenarioName::new("Users").expect("name");
        std::fs::write(harness.store.path_for(&users), b"garbage\n").expect("corrupt");

        let mut db = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut db, "Users", false)
            .await
            .expect("rebuild");
        assert_eq!(harness.seeded(), ["Users"]);
        assert_eq!(names(report.restored()), ["Roles"]);
        assert!(harness.store.load(&users).expect("load").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn revision_change_invalidates_dependents(harness: Harness) {
        let original = harness.chain("1", Behaviour::Insert);
        build(&harness, &original, &mut MemoryDatabase::new(), "Users", false)
            .await
            .expect("first run");
        harness.seeded();

        let bumped = harness.chain("2", Behaviour::Insert);
        let report = build(&harness, &bumped, &mut MemoryDatabase::new(), "Users", false)
            .await
            .expect("rebuild");
        assert_eq!(harness.seeded(), ["Roles", "Users"]);
        assert_eq!(names(report.restored()), ["Sandbox"]);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_snapshots_reset_database_first(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let mut db = MemoryDatabase::new();
        db.begin_transaction().await.expect("begin");
        db.insert("leftovers", [("id", json!(99))]).expect("insert");
        db.commit().await.expect("commit");

        build(&harness, &registry, &mut db, "Sandbox", false)
            .await
            .expect("run");
        assert_eq!(db.row_count("leftovers"), 0);
        assert_eq!(db.row_count("tenants"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn cancellation_during_seed_rolls_back(harness: Harness) {
        let token = CancellationToken::new();
        let registry = harness.chain("1", Behaviour::CancelAfterInsert(token.clone()));
        let mut db = MemoryDatabase::new();
        let err = ScenarioExecutor::new(&registry, &harness.store, &SilentReporter)
            .run_with_cancel(&mut db, "Users", false, &token)
            .await
            .expect_err("cancelled");

        assert!(
            matches!(&err, ScenarioError::Cancelled { scenario } if scenario.as_str() == "Users"),
            "{err:?}"
        );
        assert!(!db.is_active_transaction());
        assert_eq!(db.row_count("users"), 0);
        let users = ScenarioName::new("Users").expect("name");
        assert!(!harness.store.path_for(&users).exists());
    }

    #[rstest]
    #[tokio::test]
    async fn cancelled_token_stops_before_any_work(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let token = CancellationToken::new();
        token.cancel();
        let mut db = MemoryDatabase::new();
        let err = ScenarioExecutor::new(&registry, &harness.store, &SilentReporter)
            .run_with_cancel(&mut db, "Users", false, &token)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, ScenarioError::Cancelled { .. }), "{err:?}");
        assert!(harness.seeded().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn held_lock_surfaces_timeout(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let sandbox = ScenarioName::new("Sandbox").expect("name");
        let _held = harness.store.lock(&sandbox).await.expect("lock");

        let err = build(&harness, &registry, &mut MemoryDatabase::new(), "Users", false)
            .await
            .expect_err("lock timeout");
        assert!(matches!(err, ScenarioError::LockTimeout { .. }), "{err:?}");
        assert!(harness.seeded().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn cycles_fail_before_touching_database(harness: Harness) {
        let mut builder = ScenarioRegistry::builder();
        for (name, preload) in [("A", "B"), ("B", "A")] {
            let seed = InsertRow {
                scenario: "A",
                table: "t",
                revision: "1",
                behaviour: Behaviour::Insert,
                log: Arc::clone(&harness.log),
            };
            builder
                .register(
                    ScenarioDescriptor::new(name, seed)
                        .and_then(|d| d.preloads(preload))
                        .expect("descriptor"),
                )
                .expect("register");
        }
        let registry = builder.build().expect("registry");
        let mut db = MemoryDatabase::new();
        db.begin_transaction().await.expect("begin");
        db.insert("keep", [("id", json!(1))]).expect("insert");
        db.commit().await.expect("commit");

        let err = build(&harness, &registry, &mut db, "A", false)
            .await
            .expect_err("cycle");
        assert!(matches!(err, ScenarioError::CycleDetected { .. }), "{err:?}");
        assert_eq!(db.row_count("keep"), 1);
        assert!(harness.seeded().is_empty());
    }

    /// Seeds one row, then saves `planted` the way a concurrent run would.
    struct PlantSnapshot {
        store: SnapshotStore,
        planted: Arc<Mutex<Option<Snapshot>>>,
        log: SeedLog,
    }

    #[async_trait]
    impl Seed<MemoryDatabase> for PlantSnapshot {
        async fn seed(&self, db: &mut MemoryDatabase) -> anyhow::Result<()> {
            self.log.lock().expect("log lock").push("Sandbox");
            db.insert("tenants", [("id", json!(1))])?;
            if let Some(snapshot) = self.planted.lock().expect("planted lock").take() {
                self.store.save(&snapshot)?;
            }
            Ok(())
        }

        fn revision(&self) -> Cow<'_, str> {
            Cow::Borrowed("1")
        }
    }

    #[rstest]
    #[tokio::test]
    async fn forced_run_ignores_snapshot_written_after_invalidation(harness: Harness) {
        let planted = Arc::new(Mutex::new(None));
        let sandbox = PlantSnapshot {
            store: SnapshotStore::open(harness.store.root(), Duration::from_millis(100))
                .expect("second store"),
            planted: Arc::clone(&planted),
            log: Arc::clone(&harness.log),
        };
        let roles = InsertRow {
            scenario: "Roles",
            table: "roles",
            revision: "1",
            behaviour: Behaviour::Insert,
            log: Arc::clone(&harness.log),
        };
        let mut builder = ScenarioRegistry::builder();
        builder
            .register(ScenarioDescriptor::new("Sandbox", sandbox).expect("sandbox"))
            .expect("register sandbox");
        builder
            .register(
                ScenarioDescriptor::new("Roles", roles)
                    .and_then(|d| d.preloads("Sandbox"))
                    .expect("roles"),
            )
            .expect("register roles");
        let registry = builder.build().expect("registry");

        let plan = Resolver::new(&registry).resolve("Roles").expect("plan");
        let fingerprint = plan.fingerprints().last().cloned().expect("fingerprint");
        let roles_name = ScenarioName::new("Roles").expect("name");
        *planted.lock().expect("planted lock") =
            Some(Snapshot::new(roles_name, fingerprint, DataSet::default()));

        let mut db = MemoryDatabase::new();
        let report = build(&harness, &registry, &mut db, "Roles", true)
            .await
            .expect("forced run");

        assert_eq!(harness.seeded(), ["Sandbox", "Roles"]);
        assert_eq!(names(report.seeded()), ["Sandbox", "Roles"]);
        assert_eq!(db.row_count("roles"), 1);
    }

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<(String, ScenarioState)>>,
    }

    impl StatusReporter for Recording {
        fn report_plan(&self, _plan: &[ScenarioName]) {}

        fn report_transition(&self, scenario: &ScenarioName, state: ScenarioState) {
            self.events
                .lock()
                .expect("events lock")
                .push((scenario.to_string(), state));
        }

        fn report_complete(&self, _report: &ExecutionReport) {}
    }

    #[rstest]
    #[tokio::test]
    async fn transitions_are_reported(harness: Harness) {
        let registry = harness.chain("1", Behaviour::Insert);
        let recording = Recording::default();
        ScenarioExecutor::new(&registry, &harness.store, &recording)
            .run(&mut MemoryDatabase::new(), "Sandbox", false)
            .await
            .expect("run");
        let states: Vec<ScenarioState> = recording
            .events
            .lock()
            .expect("events lock")
            .iter()
            .map(|(_, state)| *state)
            .collect();
        assert_eq!(
            states,
            [
                ScenarioState::Resolving,
                ScenarioState::Seeding,
                ScenarioState::Committed,
                ScenarioState::Cached,
            ]
        );
    }
}
