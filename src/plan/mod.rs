//! Dependency resolution for scenario preload chains.
//!
//! [`Resolver::resolve`] follows `preload` references from a target back to
//! its root and returns an ancestor-first [`ExecutionPlan`]. Resolution reads
//! only the frozen registry, so plans are memoised per target name.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use scenarist::plan::Resolver;
//! use scenarist::registry::ScenarioRegistry;
//! use scenarist::scenario::{ScenarioDescriptor, Seed};
//!
//! struct Noop;
//!
//! #[async_trait]
//! impl Seed<()> for Noop {
//!     async fn seed(&self, _db: &mut ()) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut builder = ScenarioRegistry::builder();
//! builder
//!     .register(ScenarioDescriptor::new("Sandbox", Noop)?)?
//!     .register(ScenarioDescriptor::new("Roles", Noop)?.preloads("Sandbox")?)?;
//! let registry = builder.build()?;
//!
//! let plan = Resolver::new(&registry).resolve("Roles")?;
//! let order: Vec<&str> = plan.names().map(|n| n.as_str()).collect();
//! assert_eq!(order, ["Sandbox", "Roles"]);
//! # Ok::<(), scenarist::error::ScenarioError>(())
//! ```

mod cycle;

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::ScenarioError;
use crate::fingerprint::PlanHasher;
use crate::registry::ScenarioRegistry;
use crate::scenario::{ScenarioDescriptor, ScenarioName};
use cycle::VisitingSet;

/// Number of resolved plans kept per resolver.
pub const PLAN_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Ancestor-first sequence of descriptors ending with the target.
pub struct ExecutionPlan<D> {
    steps: Vec<Arc<ScenarioDescriptor<D>>>,
}

impl<D> Clone for ExecutionPlan<D> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<D> std::fmt::Debug for ExecutionPlan<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<D> ExecutionPlan<D> {
    /// Descriptors in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Arc<ScenarioDescriptor<D>>] {
        &self.steps
    }

    /// Names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &ScenarioName> {
        self.steps.iter().map(|step| step.name())
    }

    /// The scenario the plan was resolved for.
    #[must_use]
    pub fn target(&self) -> Option<&ScenarioName> {
        self.steps.last().map(|step| step.name())
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Chain fingerprint for every step, covering that step and its ancestors.
    #[must_use]
    pub fn fingerprints(&self) -> Vec<String> {
        let mut hasher = PlanHasher::new();
        self.steps
            .iter()
            .map(|step| {
                hasher.push(step.name().as_str(), &step.revision());
                hasher.current()
            })
            .collect()
    }
}

/// Resolves targets against a frozen registry.
pub struct Resolver<'r, D> {
    registry: &'r ScenarioRegistry<D>,
    memo: Mutex<LruCache<String, ExecutionPlan<D>>>,
}

impl<'r, D> Resolver<'r, D> {
    /// Create a resolver over `registry`.
    #[must_use]
    pub fn new(registry: &'r ScenarioRegistry<D>) -> Self {
        Self {
            registry,
            memo: Mutex::new(LruCache::new(PLAN_CACHE_CAPACITY)),
        }
    }

    /// The registry plans are resolved against.
    #[must_use]
    pub const fn registry(&self) -> &'r ScenarioRegistry<D> {
        self.registry
    }

    /// Resolve `target` into an ancestor-first plan.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] when `target` or one of its
    /// ancestors is not registered, and [`ScenarioError::CycleDetected`] when
    /// the preload chain loops.
    pub fn resolve(&self, target: &str) -> Result<ExecutionPlan<D>, ScenarioError> {
        if let Some(plan) = self.lock_memo().get(target) {
            debug!(scenario = target, "reusing memoised plan");
            return Ok(plan.clone());
        }
        let plan = self.walk(target)?;
        self.lock_memo().put(target.to_owned(), plan.clone());
        Ok(plan)
    }

    fn walk(&self, target: &str) -> Result<ExecutionPlan<D>, ScenarioError> {
        let mut visiting = VisitingSet::default();
        let mut stack = Vec::new();
        let mut current = Arc::clone(self.registry.lookup(target)?);
        loop {
            if let Some(cycle) = visiting.enter(current.name()) {
                return Err(ScenarioError::CycleDetected { cycle });
            }
            let preload = current.preload().cloned();
            stack.push(current);
            let Some(next) = preload else { break };
            current = Arc::clone(self.registry.lookup(next.as_str())?);
        }
        stack.reverse();
        debug!(scenario = target, steps = stack.len(), "resolved plan");
        Ok(ExecutionPlan { steps: stack })
    }

    fn lock_memo(&self) -> MutexGuard<'_, LruCache<String, ExecutionPlan<D>>> {
        match self.memo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
