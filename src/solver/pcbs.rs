use super::{search, ConflictSelector, SearchTree, Solver, Strategy};
use crate::common::{HighLevelNode, MddRequest, Task};
use crate::config::Config;
use crate::error::SolveError;
use crate::stat::Stats;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// CBS with prioritized conflicts.
///
/// By default every replan also builds the counted MDD. `PCBS::lazy` builds
/// it only for agents of conflicts that are actually classified.
pub struct PCBS {
    task: Task,
    lazy: bool,
    tree: SearchTree,
    stats: Stats,
    cancel: Option<Arc<AtomicBool>>,
}

impl PCBS {
    pub fn new(task: Task) -> Self {
        PCBS {
            task,
            lazy: false,
            tree: SearchTree::new(),
            stats: Stats::default(),
            cancel: None,
        }
    }

    pub fn lazy(task: Task) -> Self {
        PCBS {
            lazy: true,
            ..PCBS::new(task)
        }
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn strategy(&self) -> Strategy {
        if self.lazy {
            Strategy {
                name: "pcbs-lazy",
                request: MddRequest::None,
                selector: ConflictSelector::Prioritized { lazy: true },
                heuristic: false,
            }
        } else {
            Strategy {
                name: "pcbs",
                request: MddRequest::Counted,
                selector: ConflictSelector::Prioritized { lazy: false },
                heuristic: false,
            }
        }
    }
}

impl Solver for PCBS {
    fn solve(&mut self, config: &Config) -> Result<HighLevelNode, SolveError> {
        self.tree = SearchTree::new();
        self.stats = Stats::default();
        search(
            &self.task,
            self.strategy(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;

    fn cross_task() -> Task {
        let map = Map::from_rows(&["@.@", "...", "@.@"]);
        Task::new(map, vec![(0, 1), (1, 0)], vec![(2, 1), (1, 2)])
    }

    #[test]
    fn test_eager_and_lazy_agree() {
        let mut eager = PCBS::new(cross_task());
        let mut lazy = PCBS::lazy(cross_task());
        let eager_node = eager.solve(&Config::default()).unwrap();
        let lazy_node = lazy.solve(&Config::default()).unwrap();

        assert_eq!(eager_node.sum_of_costs(), 5);
        assert_eq!(lazy_node.sum_of_costs(), 5);
        assert!(eager_node.solution(0).counted_mdd.is_some());
    }
}
