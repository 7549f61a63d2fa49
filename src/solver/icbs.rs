use super::{search, ConflictSelector, SearchTree, Solver, Strategy};
use crate::common::{HighLevelNode, MddRequest, Task};
use crate::config::Config;
use crate::error::SolveError;
use crate::stat::Stats;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const STRATEGY: Strategy = Strategy {
    name: "icbs",
    request: MddRequest::Both,
    selector: ConflictSelector::Prioritized { lazy: false },
    heuristic: true,
};

/// Improved CBS: prioritized conflicts plus the vertex cover heuristic.
pub struct ICBS {
    task: Task,
    tree: SearchTree,
    stats: Stats,
    cancel: Option<Arc<AtomicBool>>,
}

impl ICBS {
    pub fn new(task: Task) -> Self {
        ICBS {
            task,
            tree: SearchTree::new(),
            stats: Stats::default(),
            cancel: None,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl Solver for ICBS {
    fn solve(&mut self, config: &Config) -> Result<HighLevelNode, SolveError> {
        self.tree = SearchTree::new();
        self.stats = Stats::default();
        search(
            &self.task,
            STRATEGY,
            config,
            self.cancel.as_deref(),
            &mut self.tree,
            &mut self.stats,
        )
    }

    fn tree(&self) -> &SearchTree {
        &self.tree
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
