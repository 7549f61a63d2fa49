use crate::common::{ConstraintSet, HighLevelNode};

use std::collections::{BTreeMap, HashSet};

/// Open and closed lists of one solve call.
///
/// Open is ordered by `(cost, insertion sequence)`, so nodes of equal cost
/// are popped first-in first-out. Closed only keeps constraint sets, which is
/// all duplicate detection needs.
#[derive(Debug, Default)]
pub struct SearchTree {
    open: BTreeMap<(usize, u64), HighLevelNode>,
    pending: HashSet<ConstraintSet>,
    closed: HashSet<ConstraintSet>,
    sequence: u64,
    expanded: usize,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_open(&mut self, node: HighLevelNode) {
        self.pending.insert(node.constraints().clone());
        self.open.insert((node.cost(), self.sequence), node);
        self.sequence += 1;
    }

    /// Cheapest node, or `None` once open is empty.
    pub fn pop_best(&mut self) -> Option<HighLevelNode> {
        let (_, node) = self.open.pop_first()?;
        self.pending.remove(node.constraints());
        self.expanded += 1;
        Some(node)
    }

    pub fn is_open_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn add_to_closed(&mut self, node: &HighLevelNode) {
        self.closed.insert(node.constraints().clone());
    }

    /// Whether a node with exactly these constraints was already expanded or
    /// is still waiting in open.
    pub fn was_expanded(&self, constraints: &ConstraintSet) -> bool {
        self.closed.contains(constraints) || self.pending.contains(constraints)
    }

    pub fn count_expanded(&self) -> usize {
        self.expanded
    }

    pub fn count_closed(&self) -> usize {
        self.closed.len()
    }
}
