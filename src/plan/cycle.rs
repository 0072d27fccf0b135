//! Cycle bookkeeping for preload chain walks.

use indexmap::IndexSet;

use crate::scenario::ScenarioName;

/// Names currently on the walk, in visiting order.
#[derive(Debug, Default)]
pub(crate) struct VisitingSet {
    stack: IndexSet<ScenarioName>,
}

impl VisitingSet {
    /// Mark `node` as visiting.
    ///
    /// Returns the canonical cycle when `node` is already on the walk.
    pub(crate) fn enter(&mut self, node: &ScenarioName) -> Option<Vec<ScenarioName>> {
        if let Some(idx) = self.stack.get_index_of(node) {
            let mut cycle: Vec<ScenarioName> = self.stack.iter().skip(idx).cloned().collect();
            cycle.push(node.clone());
            return Some(canonicalize_cycle(cycle));
        }
        self.stack.insert(node.clone());
        None
    }
}

/// Rotate a closed cycle so its smallest name comes first.
fn canonicalize_cycle(mut cycle: Vec<ScenarioName>) -> Vec<ScenarioName> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}
