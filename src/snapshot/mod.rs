//! Snapshot persistence in the scenario cache directory.
//!
//! Each scenario owns two files under the cache root: `<name>.snapshot`, the
//! encoded [`Snapshot`], and `<name>.lock`, used for advisory locking between
//! processes building the same scenario. Snapshots are written to a temporary
//! file in the same directory and renamed into place, so readers only ever see
//! complete files.

mod format;
mod lock;

pub use format::{FORMAT_TAG, FORMAT_VERSION, Snapshot};
pub use lock::SnapshotLock;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io::{self, Write};
use std::time::Duration;
use tempfile::Builder;
use tracing::{debug, info};

use crate::error::ScenarioError;
use crate::scenario::ScenarioName;

const SNAPSHOT_EXTENSION: &str = "snapshot";
const LOCK_EXTENSION: &str = "lock";

/// Snapshot files rooted at a cache directory.
#[derive(Debug)]
pub struct SnapshotStore {
    root: Utf8PathBuf,
    dir: Dir,
    lock_timeout: Duration,
}

impl SnapshotStore {
    /// Open (creating if needed) the cache directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::SnapshotIo`] when the directory cannot be
    /// created or opened.
    pub fn open(
        cache_dir: impl Into<Utf8PathBuf>,
        lock_timeout: Duration,
    ) -> Result<Self, ScenarioError> {
        let root = cache_dir.into();
        let dir = Dir::create_ambient_dir_all(&root, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(&root, ambient_authority()))
            .map_err(|source| ScenarioError::SnapshotIo {
                path: root.clone(),
                source,
            })?;
        Ok(Self {
            root,
            dir,
            lock_timeout,
        })
    }

    /// The cache directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Location of the snapshot file for `name`.
    #[must_use]
    pub fn path_for(&self, name: &ScenarioName) -> Utf8PathBuf {
        self.root.join(snapshot_file(name))
    }

    /// Atomically persist `snapshot`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::SnapshotIo`] when encoding, writing, syncing,
    /// or renaming fails. A failed save leaves no partial file behind.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), ScenarioError> {
        let path = self.path_for(&snapshot.scenario);
        let io_err = |source: io::Error| ScenarioError::SnapshotIo {
            path: path.clone(),
            source,
        };
        let bytes = format::encode(snapshot).map_err(|err| io_err(io::Error::other(err)))?;
        let mut tmp = Builder::new()
            .prefix(&format!(".{}.", snapshot.scenario))
            .suffix(".tmp")
            .tempfile_in(self.root.as_std_path())
            .map_err(io_err)?;
        {
            let handle = tmp.as_file_mut();
            handle.write_all(&bytes).map_err(io_err)?;
            handle.flush().map_err(io_err)?;
            handle.sync_all().map_err(io_err)?;
        }
        tmp.persist(path.as_std_path())
            .map_err(|err| io_err(err.error))?;
        info!(scenario = %snapshot.scenario, path = %path, bytes = bytes.len(), "saved snapshot");
        Ok(())
    }

    /// Read the snapshot for `name`.
    ///
    /// Returns `Ok(None)` when no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::CorruptSnapshot`] when the file fails
    /// validation, and [`ScenarioError::SnapshotIo`] for other read failures.
    pub fn load(&self, name: &ScenarioName) -> Result<Option<Snapshot>, ScenarioError> {
        let bytes = match self.dir.read(snapshot_file(name)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(scenario = %name, "no snapshot on disk");
                return Ok(None);
            }
            Err(source) => {
                return Err(ScenarioError::SnapshotIo {
                    path: self.path_for(name),
                    source,
                });
            }
        };
        let corrupt = |reason: String| ScenarioError::CorruptSnapshot {
            scenario: name.clone(),
            path: self.path_for(name),
            reason,
        };
        let snapshot = format::decode(&bytes).map_err(corrupt)?;
        if &snapshot.scenario != name {
            return Err(corrupt(format!(
                "header names scenario '{}'",
                snapshot.scenario
            )));
        }
        Ok(Some(snapshot))
    }

    /// Delete the snapshot for `name`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::SnapshotIo`] when removal fails for a reason
    /// other than the file being absent.
    pub fn invalidate(&self, name: &ScenarioName) -> Result<bool, ScenarioError> {
        match self.dir.remove_file(snapshot_file(name)) {
            Ok(()) => {
                info!(scenario = %name, "invalidated snapshot");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ScenarioError::SnapshotIo {
                path: self.path_for(name),
                source,
            }),
        }
    }

    /// Take the exclusive build lock for `name`, waiting up to the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::LockTimeout`] when another holder keeps the
    /// lock past the timeout, and [`ScenarioError::SnapshotIo`] when the lock
    /// file cannot be opened.
    pub async fn lock(&self, name: &ScenarioName) -> Result<SnapshotLock, ScenarioError> {
        let file_name = lock_file(name);
        lock::acquire(&self.dir, &file_name, name, self.lock_timeout)
            .await
            .map_err(|err| match err {
                lock::LockError::TimedOut => ScenarioError::LockTimeout {
                    scenario: name.clone(),
                    waited: self.lock_timeout,
                },
                lock::LockError::Io(source) => ScenarioError::SnapshotIo {
                    path: self.root.join(&file_name),
                    source,
                },
            })
    }
}

fn snapshot_file(name: &ScenarioName) -> String {
    format!("{name}.{SNAPSHOT_EXTENSION}")
}

fn lock_file(name: &ScenarioName) -> String {
    format!("{name}.{LOCK_EXTENSION}")
}
