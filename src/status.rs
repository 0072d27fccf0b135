//! Run status reporting for accessible and standard output modes.
//!
//! This module provides a [`StatusReporter`] trait plus concrete reporters for
//! accessibility-first textual output and standard terminal progress output.
//! Standard mode uses `indicatif::MultiProgress` to keep one persistent line per
//! plan step while the run advances.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::executor::{ExecutionReport, ScenarioState};
use crate::scenario::ScenarioName;

fn step_label(current: usize, total: usize, scenario: &ScenarioName) -> String {
    format!("[{current}/{total}] {scenario}")
}

fn step_summary(state: ScenarioState, current: usize, total: usize, scenario: &ScenarioName) -> String {
    format!("{}: {state}", step_label(current, total, scenario))
}

fn completion_message(report: &ExecutionReport) -> String {
    let seeded = report.seeded().count();
    let reused = report.steps.len().saturating_sub(seeded);
    format!(
        "Scenario '{}' ready ({seeded} seeded, {reused} restored from cache).",
        report.target
    )
}

/// Report run progress to the user.
pub trait StatusReporter: Send + Sync {
    /// Announce the resolved plan, ancestor first.
    fn report_plan(&self, plan: &[ScenarioName]);

    /// Emit a state change for one plan step.
    fn report_transition(&self, scenario: &ScenarioName, state: ScenarioState);

    /// Emit a completion message after a successful run.
    fn report_complete(&self, report: &ExecutionReport);
}

/// Accessible reporter: writes static, labelled lines to stderr.
#[derive(Debug, Default)]
pub struct AccessibleReporter {
    plan: Mutex<Vec<ScenarioName>>,
}

impl AccessibleReporter {
    /// Construct a reporter with no plan yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusReporter for AccessibleReporter {
    fn report_plan(&self, plan: &[ScenarioName]) {
        let mut current = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        plan.clone_into(&mut current);
        // Intentionally discard the write result: status output failures should
        // not abort the run.
        drop(writeln!(io::stderr(), "Plan: {} step(s)", plan.len()));
    }

    fn report_transition(&self, scenario: &ScenarioName, state: ScenarioState) {
        if matches!(state, ScenarioState::Resolving) {
            return;
        }
        let plan = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        let index = plan.iter().position(|name| name == scenario).unwrap_or(0);
        let message = step_summary(state, index + 1, plan.len(), scenario);
        drop(writeln!(io::stderr(), "{message}"));
    }

    fn report_complete(&self, report: &ExecutionReport) {
        drop(writeln!(io::stderr(), "{}", completion_message(report)));
    }
}

/// Silent reporter: emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn report_plan(&self, _plan: &[ScenarioName]) {}
    fn report_transition(&self, _scenario: &ScenarioName, _state: ScenarioState) {}
    fn report_complete(&self, _report: &ExecutionReport) {}
}

#[derive(Debug)]
struct IndicatifState {
    progress: MultiProgress,
    bars: Vec<ProgressBar>,
    names: Vec<ScenarioName>,
    completed: bool,
    is_hidden: bool,
}

/// Standard reporter backed by `indicatif::MultiProgress`.
pub struct IndicatifReporter {
    state: Mutex<IndicatifState>,
    style: ProgressStyle,
}

impl IndicatifReporter {
    /// Construct an `indicatif` reporter; bars are added once the plan is known.
    #[must_use]
    pub fn new() -> Self {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        progress.set_move_cursor(false);
        let style = ProgressStyle::with_template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            state: Mutex::new(IndicatifState {
                is_hidden: progress.is_hidden(),
                progress,
                bars: Vec::new(),
                names: Vec::new(),
                completed: false,
            }),
            style,
        }
    }

    fn set_step_state(state: &IndicatifState, index: usize, step: ScenarioState) {
        let Some(name) = state.names.get(index) else {
            return;
        };
        let message = step_summary(step, index + 1, state.names.len(), name);
        if state.is_hidden {
            drop(writeln!(io::stderr(), "{message}"));
            return;
        }
        if let Some(bar) = state.bars.get(index) {
            if step.is_terminal() {
                bar.finish_with_message(message);
            } else {
                bar.set_message(message);
            }
        }
    }
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndicatifReporter {
    fn drop(&mut self) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed {
            return;
        }
        for bar in state.bars.iter().filter(|bar| !bar.is_finished()) {
            bar.abandon();
        }
    }
}

impl StatusReporter for IndicatifReporter {
    fn report_plan(&self, plan: &[ScenarioName]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        plan.clone_into(&mut state.names);
        let bars: Vec<ProgressBar> = plan
            .iter()
            .map(|_| {
                let bar = state.progress.add(ProgressBar::new(1));
                bar.set_style(self.style.clone());
                bar
            })
            .collect();
        state.bars = bars;
        for index in 0..plan.len() {
            Self::set_step_state(&state, index, ScenarioState::Pending);
        }
    }

    fn report_transition(&self, scenario: &ScenarioName, step: ScenarioState) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = state.names.iter().position(|name| name == scenario) {
            Self::set_step_state(&state, index, step);
        }
    }

    fn report_complete(&self, report: &ExecutionReport) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.completed = true;
        drop(writeln!(io::stderr(), "{}", completion_message(report)));
    }
}
