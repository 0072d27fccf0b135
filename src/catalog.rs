//! YAML scenario catalogs for the bundled driver.
//!
//! A catalog declares scenarios whose seeds insert literal rows:
//!
//! ```yaml
//! scenarios:
//!   - name: Sandbox
//!     tables:
//!       tenants:
//!         - { id: 1, name: sandbox }
//!   - name: Roles
//!     preload: Sandbox
//!     tables:
//!       roles:
//!         - { id: 1, name: admin }
//! ```
//!
//! Each entry's seed revision is derived from the canonical JSON of the entry,
//! so editing a scenario in the file invalidates its snapshot and every
//! dependent one.

use anyhow::Context;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use tracing::debug;

use crate::db::MemoryDatabase;
use crate::error::ScenarioError;
use crate::fingerprint::checksum;
use crate::registry::ScenarioRegistry;
use crate::scenario::{ScenarioDescriptor, ScenarioName, Seed};

/// One row: column name to cell value.
pub type Row = IndexMap<String, Value>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    scenarios: Vec<CatalogEntry>,
}

/// A scenario declared in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    /// Scenario name.
    pub name: ScenarioName,
    /// Scenario seeded immediately before this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<ScenarioName>,
    /// Rows to insert, keyed by table.
    #[serde(default)]
    pub tables: IndexMap<String, Vec<Row>>,
}

/// Seed that inserts a catalog entry's rows.
#[derive(Debug)]
pub struct CatalogSeed {
    entry: CatalogEntry,
    revision: String,
}

impl CatalogSeed {
    /// Wrap `entry`, deriving its revision from its canonical JSON form.
    ///
    /// # Errors
    ///
    /// Fails when the entry cannot be serialised, which only happens for
    /// non-finite numbers.
    pub fn new(entry: CatalogEntry) -> Result<Self, serde_json::Error> {
        let canonical = serde_json_canonicalizer::to_vec(&entry)?;
        Ok(Self {
            revision: checksum(&canonical),
            entry,
        })
    }
}

#[async_trait]
impl Seed<MemoryDatabase> for CatalogSeed {
    async fn seed(&self, db: &mut MemoryDatabase) -> anyhow::Result<()> {
        for (table, rows) in &self.entry.tables {
            for (idx, row) in rows.iter().enumerate() {
                db.insert(table, row.iter().map(|(column, value)| (column.as_str(), value.clone())))
                    .with_context(|| format!("row {idx} of table '{table}'"))?;
            }
        }
        Ok(())
    }

    fn revision(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.revision)
    }
}

/// Parse catalog YAML into a frozen registry.
///
/// `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`ScenarioError::Catalog`] when the YAML is malformed, and the
/// registry's errors for duplicate names or dangling preloads.
pub fn from_str(
    yaml: &str,
    path: &Utf8Path,
) -> Result<ScenarioRegistry<MemoryDatabase>, ScenarioError> {
    let catalog_err = |message: String| ScenarioError::Catalog {
        path: path.to_path_buf(),
        message,
    };
    let file: CatalogFile = serde_saphyr::from_str(yaml).map_err(|err| catalog_err(err.to_string()))?;
    let mut builder = ScenarioRegistry::builder();
    for entry in file.scenarios {
        let name = entry.name.clone();
        let preload = entry.preload.clone();
        let seed = CatalogSeed::new(entry)
            .map_err(|err| catalog_err(format!("scenario '{name}': {err}")))?;
        let mut descriptor = ScenarioDescriptor::new(name, seed)?;
        if let Some(prerequisite) = preload {
            descriptor = descriptor.preloads(prerequisite)?;
        }
        builder.register(descriptor)?;
    }
    let registry = builder.build()?;
    debug!(catalog = %path, scenarios = registry.len(), "loaded scenario catalog");
    Ok(registry)
}

/// Read and parse the catalog at `path`.
///
/// # Errors
///
/// Returns [`ScenarioError::Catalog`] when the file cannot be read, plus every
/// error of [`from_str`].
pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<ScenarioRegistry<MemoryDatabase>, ScenarioError> {
    let path_ref = path.as_ref();
    let yaml = fs::read_to_string(path_ref).map_err(|err| ScenarioError::Catalog {
        path: Utf8PathBuf::from(path_ref),
        message: err.to_string(),
    })?;
    from_str(&yaml, path_ref)
}
