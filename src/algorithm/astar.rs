use super::{construct_mdd, construct_path, Trace};
use crate::common::{Agent, AgentConstraints, LowLevelOpenNode, MddRequest, Path, Solution};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument, trace};

/// Space-time A* under `constraints`. Once the search passes the latest
/// constraint time the time component of the closed key stops growing, which
/// turns the search into a plain 2-D A* and guarantees termination.
#[instrument(skip_all, name = "standard_a_star", fields(agent = agent.id, start = ?agent.start, goal = ?agent.goal), level = "debug")]
fn standard_a_star_search(
    map: &Map,
    agent: &Agent,
    heuristic: &[Vec<usize>],
    constraints: &AgentConstraints,
    stats: &mut Stats,
) -> Option<Path> {
    if !map.is_passable(agent.start.0, agent.start.1)
        || !map.is_passable(agent.goal.0, agent.goal.1)
    {
        debug!("start or goal is blocked");
        return None;
    }

    let start_h_open_cost = heuristic[agent.start.0][agent.start.1];
    if start_h_open_cost == usize::MAX || !constraints.is_vertex_allowed(agent.start, 0) {
        debug!("goal unreachable from start");
        return None;
    }

    let constraint_limit_time_step = constraints.limit_time_step();
    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut trace = Trace::new();

    open_list.insert(LowLevelOpenNode {
        position: agent.start,
        f_open_cost: start_h_open_cost,
        g_cost: 0,
        time_step: 0,
    });

    while let Some(current) = open_list.pop_first() {
        if !closed_list.insert((current.position, current.time_step)) {
            continue;
        }
        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        if current.position == agent.goal && constraints.can_finish_at(current.g_cost) {
            return Some(construct_path(&trace, (current.position, current.g_cost)));
        }

        // Assuming uniform cost, which also indicate the current time.
        let tentative_g_cost = current.g_cost + 1;
        let tentative_time_step = if current.time_step > constraint_limit_time_step {
            current.time_step
        } else {
            current.time_step + 1
        };

        for &neighbor in &map.grid[current.position.0][current.position.1].neighbors {
            if closed_list.contains(&(neighbor, tentative_time_step)) {
                continue;
            }

            if !constraints.is_move_allowed(current.position, neighbor, current.g_cost) {
                continue; // This move is prohibited due to a constraint.
            }

            let h_open_cost = heuristic[neighbor.0][neighbor.1];
            if h_open_cost == usize::MAX {
                continue;
            }

            if open_list.insert(LowLevelOpenNode {
                position: neighbor,
                f_open_cost: tentative_g_cost + h_open_cost,
                g_cost: tentative_g_cost,
                time_step: tentative_time_step,
            }) {
                trace
                    .entry((neighbor, tentative_g_cost))
                    .or_insert(current.position);
            }
        }
    }

    debug!("cannot find solution");
    None
}

/// Optimal constrained path for `agent` plus the requested decision-diagram artifacts.
#[instrument(skip_all, name = "a_star", fields(agent = agent.id), level = "debug")]
pub fn a_star_search(
    map: &Map,
    agent: &Agent,
    heuristic: &[Vec<usize>],
    constraints: &AgentConstraints,
    request: MddRequest,
    stats: &mut Stats,
) -> Option<Solution> {
    let path = standard_a_star_search(map, agent, heuristic, constraints, stats)?;
    let mut solution = Solution::new(agent.id, path);

    if !request.is_none() {
        let (counted_mdd, mdd) =
            construct_mdd(map, agent, heuristic, constraints, solution.cost);
        if request.wants_counted() {
            solution.counted_mdd = Some(counted_mdd);
        }
        if request.wants_full() {
            solution.mdd = Some(mdd);
        }
    }

    debug!("path {:?} with cost {}", solution.path, solution.cost);
    Some(solution)
}
