//! Scenario descriptors and the seed capability they carry.
//!
//! A [`ScenarioDescriptor`] pairs a stable [`ScenarioName`] with an optional
//! prerequisite and a [`Seed`] implementation. Descriptors are immutable once
//! registered; the registry hands them out behind [`Arc`].
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use scenarist::db::MemoryDatabase;
//! use scenarist::scenario::{ScenarioDescriptor, Seed};
//! use serde_json::json;
//!
//! struct Tenants;
//!
//! #[async_trait]
//! impl Seed<MemoryDatabase> for Tenants {
//!     async fn seed(&self, db: &mut MemoryDatabase) -> anyhow::Result<()> {
//!         db.insert("tenants", [("id", json!(1))])?;
//!         Ok(())
//!     }
//! }
//!
//! let sandbox = ScenarioDescriptor::new("Sandbox", Tenants)?;
//! assert!(sandbox.preload().is_none());
//! # Ok::<(), scenarist::error::ScenarioError>(())
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;

use crate::error::ScenarioError;

/// Validated scenario identifier.
///
/// Names double as snapshot file stems, so they are restricted to ASCII
/// alphanumerics plus `-`, `_`, and `.`, and may not start with `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenarioName(String);

impl ScenarioName {
    /// Validate and wrap `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::InvalidName`] when `raw` is empty, starts with
    /// `.`, or contains characters outside the permitted set.
    pub fn new(name: impl Into<String>) -> Result<Self, ScenarioError> {
        let raw = name.into();
        let reason = if raw.is_empty() {
            Some("name must not be empty")
        } else if raw.starts_with('.') {
            Some("name must not start with '.'")
        } else if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            Some("name may only contain ASCII letters, digits, '-', '_' and '.'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ScenarioError::InvalidName { name: raw, reason }),
            None => Ok(Self(raw)),
        }
    }

    /// Borrow the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ScenarioName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ScenarioName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScenarioName {
    type Error = ScenarioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ScenarioName {
    type Error = ScenarioError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScenarioName> for String {
    fn from(value: ScenarioName) -> Self {
        value.0
    }
}

/// Seeding logic for one scenario, run inside a transaction on `D`.
#[async_trait]
pub trait Seed<D>: Send + Sync {
    /// Write this scenario's data into `db`.
    ///
    /// The executor has already opened a transaction; returning an error rolls
    /// it back.
    async fn seed(&self, db: &mut D) -> anyhow::Result<()>;

    /// Marker describing the current definition of this seed.
    ///
    /// Bump it whenever the seed's behaviour changes so cached snapshots built
    /// from the old definition stop matching.
    fn revision(&self) -> Cow<'_, str> {
        Cow::Borrowed("1")
    }
}

/// A named scenario with an optional prerequisite.
pub struct ScenarioDescriptor<D> {
    name: ScenarioName,
    preload: Option<ScenarioName>,
    seed: Arc<dyn Seed<D>>,
}

impl<D> ScenarioDescriptor<D> {
    /// Describe a scenario without a prerequisite.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::InvalidName`] when `name` is not a valid
    /// [`ScenarioName`].
    pub fn new(name: impl Into<String>, seed: impl Seed<D> + 'static) -> Result<Self, ScenarioError> {
        Ok(Self {
            name: ScenarioName::new(name)?,
            preload: None,
            seed: Arc::new(seed),
        })
    }

    /// Declare `prerequisite` as the scenario seeded immediately before this one.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::InvalidName`] when `prerequisite` is invalid.
    pub fn preloads(mut self, prerequisite: impl Into<String>) -> Result<Self, ScenarioError> {
        self.preload = Some(ScenarioName::new(prerequisite)?);
        Ok(self)
    }

    /// Unique name of the scenario.
    #[must_use]
    pub const fn name(&self) -> &ScenarioName {
        &self.name
    }

    /// Name of the immediate prerequisite, if any.
    #[must_use]
    pub const fn preload(&self) -> Option<&ScenarioName> {
        self.preload.as_ref()
    }

    /// The seed operation.
    #[must_use]
    pub fn seed(&self) -> &dyn Seed<D> {
        self.seed.as_ref()
    }

    /// Current revision marker of the seed.
    #[must_use]
    pub fn revision(&self) -> Cow<'_, str> {
        self.seed.revision()
    }
}

impl<D> fmt::Debug for ScenarioDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioDescriptor")
            .field("name", &self.name)
            .field("preload", &self.preload)
            .finish_non_exhaustive()
    }
}
