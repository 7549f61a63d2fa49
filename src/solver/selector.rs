use super::Planner;
use crate::common::{Conflict, HighLevelNode, MddRequest};
use crate::stat::Stats;

use std::cmp::Reverse;
use tracing::trace;

/// Picks the conflict to split on: the first one cardinal for both agents,
/// else the last semi-cardinal one, else the first conflict found.
///
/// Conflicts involving the busiest agents are inspected first.
pub(crate) fn select_prioritized(
    node: &mut HighLevelNode,
    conflicts: &[Conflict],
    planner: &Planner,
    lazy: bool,
    stats: &mut Stats,
) -> Conflict {
    let mut participation = vec![0usize; node.num_agents()];
    for conflict in conflicts {
        let (agent_1, agent_2) = conflict.agents();
        participation[agent_1] += 1;
        participation[agent_2] += 1;
    }

    let mut ordered: Vec<&Conflict> = conflicts.iter().collect();
    ordered.sort_by_key(|conflict| {
        let (agent_1, agent_2) = conflict.agents();
        Reverse(participation[agent_1] + participation[agent_2])
    });

    let mut semi_cardinal = None;
    for conflict in ordered {
        let (agent_1, agent_2) = conflict.agents();
        let layer = conflict.mdd_layer();
        let cardinal_1 = is_cardinal(node, agent_1, layer, planner, lazy, stats);
        let cardinal_2 = is_cardinal(node, agent_2, layer, planner, lazy, stats);

        if cardinal_1 && cardinal_2 {
            trace!("cardinal conflict {conflict:?}");
            return conflict.clone();
        }
        if cardinal_1 || cardinal_2 {
            semi_cardinal = Some(conflict);
        }
    }

    match semi_cardinal {
        Some(conflict) => {
            trace!("semi-cardinal conflict {conflict:?}");
            conflict.clone()
        }
        None => conflicts[0].clone(),
    }
}

fn is_cardinal(
    node: &mut HighLevelNode,
    agent: usize,
    layer: usize,
    planner: &Planner,
    lazy: bool,
    stats: &mut Stats,
) -> bool {
    if lazy && node.solution(agent).counted_mdd.is_none() {
        let counted_mdd = planner
            .plan(node.constraints(), agent, MddRequest::Counted, stats)
            .and_then(|solution| solution.counted_mdd);
        node.solution_mut(agent).counted_mdd = counted_mdd;
    }

    node.solution(agent)
        .counted_mdd
        .as_ref()
        .is_some_and(|counted| counted.is_thin(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Task, VertexConflict};
    use crate::map::Map;

    fn conflict(agents: (usize, usize), time_step: usize) -> Conflict {
        Conflict::Vertex(VertexConflict {
            agents,
            time_step,
            position: (0, 0),
        })
    }

    fn task() -> Task {
        let map = Map::from_rows(&["...", "...", "..."]);
        Task::new(map, vec![(0, 0), (0, 2), (2, 0)], vec![(2, 2), (2, 0), (0, 2)])
    }

    fn planned_node(task: &Task, request: MddRequest) -> HighLevelNode {
        let planner = Planner::new(task);
        let mut stats = Stats::default();
        let solutions = (0..task.num_agents())
            .map(|agent| {
                planner
                    .plan(&Default::default(), agent, request, &mut stats)
                    .unwrap()
            })
            .collect();
        HighLevelNode::new(solutions)
    }

    #[test]
    fn test_cardinal_conflict_wins() {
        let task = task();
        let planner = Planner::new(&task);
        let mut node = planned_node(&task, MddRequest::Counted);

        // Layer 0 is the start, a single option for everybody.
        let conflicts = vec![conflict((0, 1), 1), conflict((1, 2), 0)];
        let selected = select_prioritized(
            &mut node,
            &conflicts,
            &planner,
            false,
            &mut Stats::default(),
        );
        assert_eq!(selected, conflicts[1]);
    }

    #[test]
    fn test_falls_back_to_first_conflict() {
        let task = task();
        let planner = Planner::new(&task);
        let mut node = planned_node(&task, MddRequest::Counted);

        // Agents 0 and 1 both have two options at time 1 on the open grid.
        let conflicts = vec![conflict((0, 1), 1), conflict((1, 0), 1)];
        let selected = select_prioritized(
            &mut node,
            &conflicts,
            &planner,
            false,
            &mut Stats::default(),
        );
        assert_eq!(selected, conflicts[0]);
    }

    #[test]
    fn test_semi_cardinal_when_one_agent_is_done() {
        // Agent 1 starts on its goal, so any layer is thin for it.
        let map = Map::from_rows(&["...", "...", "..."]);
        let task = Task::new(map, vec![(0, 0), (1, 1)], vec![(2, 2), (1, 1)]);
        let planner = Planner::new(&task);
        let mut node = planned_node(&task, MddRequest::Counted);

        let conflicts = vec![conflict((0, 1), 1)];
        let selected = select_prioritized(
            &mut node,
            &conflicts,
            &planner,
            false,
            &mut Stats::default(),
        );
        assert_eq!(selected, conflicts[0]);
        assert!(node.solution(1).counted_mdd.as_ref().unwrap().is_thin(2));
        assert!(!node.solution(0).counted_mdd.as_ref().unwrap().is_thin(2));
    }

    #[test]
    fn test_lazy_attaches_counted_mdd_without_touching_parent() {
        let task = task();
        let planner = Planner::new(&task);
        let parent = planned_node(&task, MddRequest::None);
        let mut node = parent.clone();

        let conflicts = vec![conflict((0, 2), 1)];
        select_prioritized(&mut node, &conflicts, &planner, true, &mut Stats::default());

        assert!(node.solution(0).counted_mdd.is_some());
        assert!(node.solution(2).counted_mdd.is_some());
        assert!(node.solution(1).counted_mdd.is_none());
        assert!(parent.solution(0).counted_mdd.is_none());
        assert_eq!(node.solution(0).path, parent.solution(0).path);
    }

    #[test]
    fn test_busiest_agents_are_checked_first() {
        let task = task();
        let planner = Planner::new(&task);
        let mut node = planned_node(&task, MddRequest::Counted);

        // Every layer-0 conflict is cardinal, so only the order decides.
        let conflicts = vec![conflict((0, 1), 0), conflict((1, 2), 0), conflict((2, 0), 0)];
        let selected = select_prioritized(
            &mut node,
            &conflicts,
            &planner,
            false,
            &mut Stats::default(),
        );
        // Every pair sums to 4, so the stable sort keeps simulator order.
        assert_eq!(selected, conflicts[0]);

        let conflicts = vec![conflict((0, 1), 0), conflict((1, 2), 0), conflict((2, 1), 0)];
        let selected = select_prioritized(
            &mut node,
            &conflicts,
            &planner,
            false,
            &mut Stats::default(),
        );
        assert_eq!(selected, conflicts[1]);
    }
}
