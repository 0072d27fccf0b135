//! Advisory per-scenario lock files.
//!
//! Uses `fs2::FileExt` so processes building the same scenario against one
//! cache directory serialise their snapshot writes. The lock is released when
//! the [`SnapshotLock`] guard drops; the lock file itself is left in place so
//! waiters never race on a file that is being unlinked.

use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use fs2::FileExt;
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::scenario::ScenarioName;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub(super) enum LockError {
    TimedOut,
    Io(io::Error),
}

/// Exclusive hold on a scenario's snapshot lock.
pub struct SnapshotLock {
    file: std::fs::File,
    scenario: ScenarioName,
}

impl fmt::Debug for SnapshotLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotLock")
            .field("scenario", &self.scenario)
            .finish_non_exhaustive()
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            debug!(scenario = %self.scenario, error = %err, "failed to release snapshot lock");
        }
    }
}

pub(super) async fn acquire(
    dir: &Dir,
    file_name: &str,
    scenario: &ScenarioName,
    timeout: Duration,
) -> Result<SnapshotLock, LockError> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(false);
    let file = dir
        .open_with(file_name, &options)
        .map_err(LockError::Io)?
        .into_std();
    let deadline = Instant::now() + timeout;
    loop {
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(scenario = %scenario, "acquired snapshot lock");
                return Ok(SnapshotLock {
                    file,
                    scenario: scenario.clone(),
                });
            }
            Err(err) if is_contended(&err) => {}
            Err(err) => return Err(LockError::Io(err)),
        }
        if Instant::now() >= deadline {
            return Err(LockError::TimedOut);
        }
        debug!(scenario = %scenario, "snapshot lock held elsewhere; waiting");
        sleep(POLL_INTERVAL).await;
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
