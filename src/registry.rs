//! The set of known scenarios.
//!
//! Scenarios are added to a [`RegistryBuilder`] during setup. [`RegistryBuilder::build`]
//! links every `preload` reference and freezes the result into an immutable
//! [`ScenarioRegistry`] that resolvers and executors borrow.

use indexmap::IndexMap;
use indexmap::map::Entry;
use std::fmt;
use std::sync::Arc;

use crate::error::ScenarioError;
use crate::scenario::{ScenarioDescriptor, ScenarioName};

/// Collects descriptors before the registry is frozen.
pub struct RegistryBuilder<D> {
    scenarios: IndexMap<ScenarioName, Arc<ScenarioDescriptor<D>>>,
}

impl<D> Default for RegistryBuilder<D> {
    fn default() -> Self {
        Self {
            scenarios: IndexMap::new(),
        }
    }
}

impl<D> RegistryBuilder<D> {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DuplicateScenario`] when the name is taken.
    pub fn register(&mut self, descriptor: ScenarioDescriptor<D>) -> Result<&mut Self, ScenarioError> {
        match self.scenarios.entry(descriptor.name().clone()) {
            Entry::Occupied(entry) => Err(ScenarioError::DuplicateScenario {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(descriptor));
                Ok(self)
            }
        }
    }

    /// Freeze the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] when a descriptor preloads a
    /// name that was never registered.
    pub fn build(self) -> Result<ScenarioRegistry<D>, ScenarioError> {
        for descriptor in self.scenarios.values() {
            if let Some(preload) = descriptor.preload()
                && !self.scenarios.contains_key(preload)
            {
                return Err(ScenarioError::UnknownScenario {
                    name: preload.to_string(),
                    referenced_by: Some(descriptor.name().clone()),
                });
            }
        }
        Ok(ScenarioRegistry {
            scenarios: self.scenarios,
        })
    }
}

/// Immutable, shareable set of scenario descriptors.
pub struct ScenarioRegistry<D> {
    scenarios: IndexMap<ScenarioName, Arc<ScenarioDescriptor<D>>>,
}

impl<D> ScenarioRegistry<D> {
    /// Start registering scenarios.
    #[must_use]
    pub fn builder() -> RegistryBuilder<D> {
        RegistryBuilder::new()
    }

    /// Fetch the descriptor called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] when nothing is registered
    /// under `name`.
    pub fn lookup(&self, name: &str) -> Result<&Arc<ScenarioDescriptor<D>>, ScenarioError> {
        self.scenarios
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownScenario {
                name: name.to_owned(),
                referenced_by: None,
            })
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScenarioDescriptor<D>>> {
        self.scenarios.values()
    }

    /// Iterate names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &ScenarioName> {
        self.scenarios.keys()
    }

    /// Number of registered scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether no scenarios are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl<D> fmt::Debug for ScenarioRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.scenarios.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Seed;
    use async_trait::async_trait;
    use rstest::rstest;

    struct Noop;

    #[async_trait]
    impl Seed<()> for Noop {
        async fn seed(&self, _db: &mut ()) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn descriptor(name: &str, preload: Option<&str>) -> ScenarioDescriptor<()> {
        let base = ScenarioDescriptor::new(name, Noop).expect("name");
        match preload {
            Some(p) => base.preloads(p).expect("preload"),
            None => base,
        }
    }

    #[rstest]
    fn register_and_lookup() -> Result<(), ScenarioError> {
        let mut builder = ScenarioRegistry::builder();
        builder
            .register(descriptor("Sandbox", None))?
            .register(descriptor("Roles", Some("Sandbox")))?;
        let registry = builder.build()?;
        assert_eq!(registry.len(), 2);
        let roles = registry.lookup("Roles")?;
        assert_eq!(roles.preload().map(ScenarioName::as_str), Some("Sandbox"));
        let names: Vec<&str> = registry.iter().map(|d| d.name().as_str()).collect();
        assert_eq!(names, ["Sandbox", "Roles"]);
        assert!(registry.names().eq(registry.iter().map(|d| d.name())));
        Ok(())
    }

    #[rstest]
    fn duplicate_names_are_rejected() {
        let mut builder = ScenarioRegistry::builder();
        builder.register(descriptor("Sandbox", None)).expect("first");
        let err = builder
            .register(descriptor("Sandbox", None))
            .err()
            .expect("duplicate");
        assert!(
            matches!(&err, ScenarioError::DuplicateScenario { name } if name.as_str() == "Sandbox"),
            "{err:?}"
        );
    }

    #[rstest]
    fn unknown_lookup_fails() {
        let registry = ScenarioRegistry::<()>::builder().build().expect("empty");
        let err = registry.lookup("Ghost").expect_err("unknown");
        assert!(matches!(err, ScenarioError::UnknownScenario { referenced_by: None, .. }));
    }

    #[rstest]
    fn dangling_preload_fails_at_build() {
        let mut builder = ScenarioRegistry::builder();
        builder
            .register(descriptor("Users", Some("Roles")))
            .expect("register");
        let err = builder.build().expect_err("dangling preload");
        assert_eq!(err.to_string(), "scenario 'Users' preloads unknown scenario 'Roles'");
    }
}
