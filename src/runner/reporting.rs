//! Output mode detection and status reporter selection.
//!
//! Accessible (static line) output is chosen when forced with
//! `--accessible true`, or auto-detected from `NO_COLOR`, `TERM=dumb`, or a
//! `CI` environment. Standard mode animates one line per plan step unless
//! `--progress false` silences it.

use std::env;

use crate::status::{AccessibleReporter, IndicatifReporter, SilentReporter, StatusReporter};

/// Whether terminal output should be static text or animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Static labelled lines, suitable for screen readers, dumb terminals, and CI.
    Accessible,
    /// Animated progress lines.
    Standard,
}

/// Resolve the output mode from the `--accessible` flag and the environment.
#[must_use]
pub fn resolve_mode(explicit: Option<bool>) -> OutputMode {
    resolve_mode_with(explicit, |key| env::var(key).ok())
}

/// Testable variant of [`resolve_mode`] taking an environment lookup.
#[must_use]
pub fn resolve_mode_with<F>(explicit: Option<bool>, read_env: F) -> OutputMode
where
    F: Fn(&str) -> Option<String>,
{
    let accessible = explicit.unwrap_or_else(|| {
        read_env("NO_COLOR").is_some()
            || read_env("TERM").as_deref() == Some("dumb")
            || read_env("CI").is_some_and(|value| !value.is_empty() && value != "false")
    });
    if accessible {
        OutputMode::Accessible
    } else {
        OutputMode::Standard
    }
}

/// Build the [`StatusReporter`] for `mode` and the progress preference.
#[must_use]
pub fn make_reporter(mode: OutputMode, progress: Option<bool>) -> Box<dyn StatusReporter> {
    match (mode, progress.unwrap_or(true)) {
        (_, false) => Box::new(SilentReporter),
        (OutputMode::Accessible, true) => Box::new(AccessibleReporter::new()),
        (OutputMode::Standard, true) => Box::new(IndicatifReporter::new()),
    }
}
