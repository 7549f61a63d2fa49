use crate::common::{Agent, AgentConstraints, CountedMdd, Mdd, Point};
use crate::map::Map;

use std::collections::BTreeSet;
use tracing::trace;

/// Builds the decision diagram of all constrained paths of exactly `cost`
/// steps: forward reachability from the start, then a backward sweep from the
/// goal keeping only points that can still make it in time.
pub fn construct_mdd(
    map: &Map,
    agent: &Agent,
    heuristic: &[Vec<usize>],
    constraints: &AgentConstraints,
    cost: usize,
) -> (CountedMdd, Mdd) {
    let mut forward: Vec<BTreeSet<Point>> = Vec::with_capacity(cost + 1);
    forward.push(BTreeSet::from([agent.start]));
    for time in 0..cost {
        let next: BTreeSet<Point> = forward[time]
            .iter()
            .flat_map(|&p| {
                map.grid[p.0][p.1]
                    .neighbors
                    .iter()
                    .copied()
                    .filter(move |&q| constraints.is_move_allowed(p, q, time))
            })
            .filter(|q| {
                heuristic[q.0][q.1] != usize::MAX && time + 1 + heuristic[q.0][q.1] <= cost
            })
            .collect();
        forward.push(next);
    }

    let mut layers: Vec<BTreeSet<Point>> = vec![BTreeSet::new(); cost + 1];
    let mut edge_counts = vec![0; cost];
    if forward[cost].contains(&agent.goal) {
        layers[cost].insert(agent.goal);
    }
    for time in (0..cost).rev() {
        let (current, next) = layers.split_at_mut(time + 1);
        let next = &next[0];
        for &p in &forward[time] {
            let successors = map.grid[p.0][p.1]
                .neighbors
                .iter()
                .filter(|&&q| next.contains(&q) && constraints.is_move_allowed(p, q, time))
                .count();
            if successors > 0 {
                current[time].insert(p);
                edge_counts[time] += successors;
            }
        }
    }

    let mut counted = Vec::with_capacity(2 * cost + 1);
    for (time, layer) in layers.iter().enumerate() {
        counted.push(layer.len());
        if let Some(&edges) = edge_counts.get(time) {
            counted.push(edges);
        }
    }
    trace!("agent {} mdd counts {counted:?}", agent.id);

    (CountedMdd(counted), Mdd { layers })
}
