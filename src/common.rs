mod constraint;
mod highlevel;
mod lowlevel;
mod mdd;

pub use constraint::{
    Conflict, Constraint, ConstraintSet, Edge, EdgeConflict, EdgeConstraint, VertexConflict,
    VertexConstraint,
};
pub use highlevel::HighLevelNode;
pub use lowlevel::AgentConstraints;
pub(crate) use lowlevel::LowLevelOpenNode;
pub use mdd::{CountedMdd, Mdd, MddRequest};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SolveError;
use crate::map::Map;

pub type Point = (usize, usize);
pub type Path = Vec<Point>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: Point,
    pub goal: Point,
}

impl Agent {
    pub fn verify(&self, map: &Map) -> bool {
        map.is_passable(self.start.0, self.start.1) && map.is_passable(self.goal.0, self.goal.1)
    }
}

/// A MAPF instance: a map plus one start and one goal per agent.
#[derive(Debug, Clone)]
pub struct Task {
    pub map: Map,
    pub starts: Vec<Point>,
    pub goals: Vec<Point>,
}

impl Task {
    pub fn new(map: Map, starts: Vec<Point>, goals: Vec<Point>) -> Self {
        Task { map, starts, goals }
    }

    pub fn from_agents(map: Map, agents: &[Agent]) -> Self {
        let mut agents = agents.to_vec();
        agents.sort_by_key(|agent| agent.id);
        Task {
            map,
            starts: agents.iter().map(|agent| agent.start).collect(),
            goals: agents.iter().map(|agent| agent.goal).collect(),
        }
    }

    pub fn num_agents(&self) -> usize {
        self.starts.len()
    }

    /// Agent `i` is `(starts[i], goals[i])`. Only meaningful on a validated task.
    pub fn agents(&self) -> Vec<Agent> {
        self.starts
            .iter()
            .zip(&self.goals)
            .enumerate()
            .map(|(id, (&start, &goal))| Agent { id, start, goal })
            .collect()
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if self.starts.is_empty() && self.goals.is_empty() {
            return Err(SolveError::TaskInvalid("task has no agents".to_string()));
        }

        if self.starts.len() != self.goals.len() {
            return Err(SolveError::TaskInvalid(format!(
                "{} start points but {} goal points",
                self.starts.len(),
                self.goals.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(point) = self.starts.iter().find(|&&p| !seen.insert(p)) {
            return Err(SolveError::TaskInvalid(format!(
                "duplicate start point {point:?}"
            )));
        }

        seen.clear();
        if let Some(point) = self.goals.iter().find(|&&p| !seen.insert(p)) {
            return Err(SolveError::TaskInvalid(format!(
                "duplicate goal point {point:?}"
            )));
        }

        Ok(())
    }
}

/// One agent's path under the constraints of the node holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub agent_id: usize,
    pub path: Path,
    pub cost: usize,
    pub counted_mdd: Option<CountedMdd>,
    pub mdd: Option<Mdd>,
}

impl Solution {
    pub fn new(agent_id: usize, path: Path) -> Self {
        assert!(!path.is_empty(), "a path contains at least the start point");
        Solution {
            agent_id,
            cost: path.len() - 1,
            path,
            counted_mdd: None,
            mdd: None,
        }
    }

    /// Past the end of the path the agent waits at its goal.
    pub fn point_at(&self, time: usize) -> Point {
        match self.path.get(time) {
            Some(&point) => point,
            None => self.path[self.path.len() - 1],
        }
    }
}
