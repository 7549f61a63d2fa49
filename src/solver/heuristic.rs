use crate::common::HighLevelNode;

use std::collections::BTreeSet;
use tracing::trace;

/// Admissible lower bound on the remaining cost of `node`: the minimum vertex
/// cover of the graph of agents whose MDDs force a conflict.
pub(crate) fn graph_cover_heuristic(node: &HighLevelNode) -> usize {
    let edges = conflict_graph(node);
    let h_cost = min_vertex_cover(&edges);
    trace!("conflict graph {edges:?}, h = {h_cost}");
    h_cost
}

/// Two agents are adjacent when some layer of both full MDDs is the same
/// single point.
pub(crate) fn conflict_graph(node: &HighLevelNode) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for agent_1 in 0..node.num_agents() {
        let Some(mdd_1) = node.solution(agent_1).mdd.as_ref() else {
            continue;
        };
        for agent_2 in agent_1 + 1..node.num_agents() {
            let Some(mdd_2) = node.solution(agent_2).mdd.as_ref() else {
                continue;
            };
            let forced = (0..mdd_1.len().min(mdd_2.len())).any(|layer| {
                matches!(
                    (mdd_1.singleton(layer), mdd_2.singleton(layer)),
                    (Some(p), Some(q)) if p == q
                )
            });
            if forced {
                edges.push((agent_1, agent_2));
            }
        }
    }
    edges
}

pub(crate) fn min_vertex_cover(edges: &[(usize, usize)]) -> usize {
    if edges.is_empty() {
        return 0;
    }
    (1..)
        .find(|&k| k_vertex_cover(edges, k))
        .unwrap_or_default()
}

/// Whether the graph given by `edges` has a vertex cover of at most `k` nodes.
fn k_vertex_cover(edges: &[(usize, usize)], k: usize) -> bool {
    if edges.is_empty() {
        return true;
    }
    let num_nodes = edges
        .iter()
        .flat_map(|&(u, v)| [u, v])
        .collect::<BTreeSet<_>>()
        .len();
    if edges.len() > k * num_nodes {
        return false;
    }

    let (u, v) = edges[0];
    [u, v].into_iter().any(|removed| {
        let rest: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(a, b)| a != removed && b != removed)
            .collect();
        k_vertex_cover(&rest, k - 1)
    })
}
