//! Scoped environment mutation for tests.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. [`ScopedEnv`] holds a global lock for its whole
//! lifetime and restores every variable it touched when dropped.
//!
//! # Examples
//!
//! ```
//! use test_support::ScopedEnv;
//!
//! let mut env = ScopedEnv::new();
//! env.set("SCENARIST_DOC_EXAMPLE", "1");
//! assert_eq!(std::env::var("SCENARIST_DOC_EXAMPLE").as_deref(), Ok("1"));
//! drop(env);
//! assert!(std::env::var("SCENARIST_DOC_EXAMPLE").is_err());
//! ```

use std::ffi::OsString;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the environment lock and the values to restore.
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl fmt::Debug for ScopedEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedEnv")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

impl Default for ScopedEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedEnv {
    /// Acquire the global environment lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _guard: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn remember(&mut self, name: &str) {
        if self.saved.iter().all(|(saved, _)| saved != name) {
            self.saved.push((name.to_owned(), std::env::var_os(name)));
        }
    }

    /// Set `name` to `value` until the guard drops.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.remember(name);
        // SAFETY: the held lock serialises mutations of the process environment.
        unsafe { std::env::set_var(name, value) };
        self
    }

    /// Unset `name` until the guard drops.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.remember(name);
        // SAFETY: the held lock serialises mutations of the process environment.
        unsafe { std::env::remove_var(name) };
        self
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..).rev() {
            // SAFETY: the lock is still held while previous values are restored.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(&name, value),
                    None => std::env::remove_var(&name),
                }
            }
        }
    }
}
