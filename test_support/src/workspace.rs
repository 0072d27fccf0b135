//! Temporary directories laid out for driver tests.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use scenario_env::DEFAULT_CACHE_DIR;
use std::fs;
use tempfile::TempDir;

/// A temporary directory holding a catalog and a snapshot cache.
#[derive(Debug)]
pub struct ScenarioWorkspace {
    root: Utf8PathBuf,
    _temp: TempDir,
}

impl ScenarioWorkspace {
    /// Create an empty workspace.
    ///
    /// # Errors
    ///
    /// Fails when the temporary directory cannot be created or its path is not
    /// UTF-8.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create scenario workspace")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow!("workspace path {} is not UTF-8", path.display()))?;
        Ok(Self { root, _temp: temp })
    }

    /// Create a workspace whose `scenarios.yml` contains `yaml`.
    ///
    /// # Errors
    ///
    /// See [`ScenarioWorkspace::new`] and [`ScenarioWorkspace::write_catalog`].
    pub fn with_catalog(yaml: &str) -> Result<Self> {
        let workspace = Self::new()?;
        workspace.write_catalog(yaml)?;
        Ok(workspace)
    }

    /// Workspace root; use it as the driver's working directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Location of the default catalog file.
    #[must_use]
    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.root.join("scenarios.yml")
    }

    /// Replace the default catalog with `yaml`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn write_catalog(&self, yaml: &str) -> Result<Utf8PathBuf> {
        let path = self.catalog_path();
        fs::write(&path, yaml).with_context(|| format!("write catalog {path}"))?;
        Ok(path)
    }

    /// The cache directory the driver uses when no override is given.
    #[must_use]
    pub fn default_cache_dir(&self) -> Utf8PathBuf {
        self.root.join(DEFAULT_CACHE_DIR)
    }

    /// Snapshot file for `scenario` inside `cache_dir`.
    #[must_use]
    pub fn snapshot_path(cache_dir: &Utf8Path, scenario: &str) -> Utf8PathBuf {
        cache_dir.join(format!("{scenario}.snapshot"))
    }

    /// Names of the snapshot files present in `cache_dir`, sorted.
    ///
    /// # Errors
    ///
    /// Fails when the directory exists but cannot be listed.
    pub fn snapshots(cache_dir: &Utf8Path) -> Result<Vec<String>> {
        if !cache_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in cache_dir
            .read_dir_utf8()
            .with_context(|| format!("list {cache_dir}"))?
        {
            let entry = entry.with_context(|| format!("read entry in {cache_dir}"))?;
            if let Some(stem) = entry.file_name().strip_suffix(".snapshot") {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
