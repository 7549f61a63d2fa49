use std::cmp::Ordering;
use std::collections::HashSet;

use super::{ConstraintSet, Edge, Point};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: Point,
    pub(crate) f_open_cost: usize,
    pub(crate) g_cost: usize,
    pub(crate) time_step: usize, // before reach constraint limit, time_step is exactly same as g_cost
}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            // Higher g cost (time) has higher priority
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| self.time_step.cmp(&other.time_step))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One agent's slice of a node's constraints, indexed for constant-time checks.
#[derive(Debug, Clone, Default)]
pub struct AgentConstraints {
    vertex: HashSet<(Point, usize)>,
    edge: HashSet<(Edge, usize)>,
    limit_time_step: usize,
    goal_time_step: Option<usize>,
}

impl AgentConstraints {
    pub fn new(constraints: &ConstraintSet, agent: usize, goal: Point) -> Self {
        let mut indexed = AgentConstraints::default();

        for c in constraints.vertex_for(agent) {
            indexed.vertex.insert((c.position, c.time_step));
            indexed.limit_time_step = indexed.limit_time_step.max(c.time_step);
            if c.position == goal {
                indexed.goal_time_step = indexed.goal_time_step.max(Some(c.time_step));
            }
        }
        for c in constraints.edge_for(agent) {
            indexed.edge.insert((c.edge, c.time_step));
            indexed.limit_time_step = indexed.limit_time_step.max(c.time_step + 1);
        }

        indexed
    }

    /// Latest time step any constraint of this agent refers to.
    pub fn limit_time_step(&self) -> usize {
        self.limit_time_step
    }

    /// Whether moving `from -> to` between `time` and `time + 1` is permitted.
    pub fn is_move_allowed(&self, from: Point, to: Point, time: usize) -> bool {
        if self.vertex.contains(&(to, time + 1)) {
            return false;
        }
        from == to || !self.edge.contains(&(Edge::new(from, to), time))
    }

    /// The agent may stop at its goal at `time` only if it is never forbidden there afterwards.
    pub fn can_finish_at(&self, time: usize) -> bool {
        self.goal_time_step.map_or(true, |limit| time > limit)
    }

    pub fn is_vertex_allowed(&self, position: Point, time: usize) -> bool {
        !self.vertex.contains(&(position, time))
    }
}
