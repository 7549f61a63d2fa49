use super::{search, ConflictSelector, SearchTree, Solver, Strategy};
use crate::common::{HighLevelNode, MddRequest, Task};
use crate::config::Config;
use crate::error::SolveError;
use crate::stat::Stats;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const STRATEGY: Strategy = Strategy {
    name: "cbsh",
    request: MddRequest::Full,
    selector: ConflictSelector::FirstFound,
    heuristic: true,
};

/// CBS whose node costs include the conflict graph vertex cover bound.
pub struct CBSH {
    task: Task,
    tree: SearchTree,
    stats: Stats,
    cancel: Option<Arc<AtomicBool>>,
}

impl CBSH {
    pub fn new(task: Task) -> Self {
        CBSH {
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

impl Solver for CBSH {
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
