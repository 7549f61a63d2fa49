use super::{
    Conflict, Constraint, ConstraintSet, Edge, EdgeConflict, Path, Point, Solution, Task,
    VertexConflict,
};

use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// A point in the constraint tree.
///
/// Identity for duplicate detection is the constraint set alone. Solutions
/// are shared between parent and children; only the replanned agent's entry
/// is replaced, so siblings never observe each other's changes.
#[derive(Clone, Debug)]
pub struct HighLevelNode {
    pub(crate) constraints: ConstraintSet,
    pub(crate) solutions: Vec<Rc<Solution>>,
    pub(crate) cost: usize, // Sum of costs plus the heuristic added at creation
    pub(crate) h_cost: usize,
    pub(crate) time: usize, // Makespan
}

impl HighLevelNode {
    pub(crate) fn new(solutions: Vec<Solution>) -> Self {
        assert!(!solutions.is_empty(), "a node needs at least one agent");
        let solutions: Vec<Rc<Solution>> = solutions.into_iter().map(Rc::new).collect();
        let (cost, time) = aggregate(&solutions);
        HighLevelNode {
            constraints: ConstraintSet::new(),
            solutions,
            cost,
            h_cost: 0,
            time,
        }
    }

    /// Child node with `constraint` added and the constrained agent's solution replaced.
    pub(crate) fn child(&self, constraint: Constraint, solution: Solution) -> Self {
        let agent = constraint.agent();
        assert_eq!(agent, solution.agent_id);

        let mut solutions = self.solutions.clone();
        solutions[agent] = Rc::new(solution);
        let (cost, time) = aggregate(&solutions);

        HighLevelNode {
            constraints: self.constraints.with(constraint),
            solutions,
            cost,
            h_cost: 0,
            time,
        }
    }

    pub(crate) fn with_heuristic(mut self, h_cost: usize) -> Self {
        self.cost = self.cost - self.h_cost + h_cost;
        self.h_cost = h_cost;
        self
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn cost(&self) -> usize {
        self.cost
    }

    pub fn sum_of_costs(&self) -> usize {
        self.cost - self.h_cost
    }

    pub fn makespan(&self) -> usize {
        self.time
    }

    pub fn num_agents(&self) -> usize {
        self.solutions.len()
    }

    pub fn solution(&self, agent: usize) -> &Solution {
        &self.solutions[agent]
    }

    /// Copy-on-write access, used to attach lazily built artifacts.
    pub(crate) fn solution_mut(&mut self, agent: usize) -> &mut Solution {
        Rc::make_mut(&mut self.solutions[agent])
    }

    pub fn paths(&self) -> Vec<Path> {
        self.solutions.iter().map(|s| s.path.clone()).collect()
    }

    /// Simulates all paths step by step and returns the conflicts of the
    /// earliest conflicting time step. Empty means the paths are a valid solution.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let mut last_step: HashMap<Point, Vec<usize>> = HashMap::new();

        for time in 0..=self.time {
            let mut current_step: HashMap<Point, Vec<usize>> = HashMap::new();

            for solution in &self.solutions {
                let agent = solution.agent_id;
                let v = solution.point_at(time);

                // Someone is already there.
                let occupants = current_step.entry(v).or_default();
                for &other in occupants.iter() {
                    conflicts.push(Conflict::Vertex(VertexConflict {
                        agents: (agent, other),
                        time_step: time,
                        position: v,
                    }));
                }
                occupants.push(agent);

                // Someone was there on the previous step and is now where we came from.
                let other = match last_step.get(&v).map(Vec::as_slice) {
                    Some(&[other]) if other != agent => other,
                    _ => continue,
                };
                let previous_point = solution.point_at(time - 1);
                let other_current_point = self.solutions[other].point_at(time);
                if other_current_point == previous_point {
                    conflicts.push(Conflict::Edge(EdgeConflict {
                        agents: (agent, other),
                        time_step: time - 1,
                        edge: Edge::new(previous_point, v),
                    }));
                    // Our own previous entry, so `other` will not report the same swap.
                    last_step.remove(&previous_point);
                }
            }

            if !conflicts.is_empty() {
                trace!("conflicts at time {time}: {conflicts:?}");
                return conflicts;
            }

            last_step = current_step;
        }

        conflicts
    }

    /// Checks starts, goals, move legality on the task map and conflict-freeness.
    pub fn verify(&self, task: &Task) -> bool {
        if self.solutions.len() != task.num_agents() {
            return false;
        }

        for (agent, solution) in self.solutions.iter().enumerate() {
            let path = &solution.path;
            if path.first() != Some(&task.starts[agent]) || path.last() != Some(&task.goals[agent])
            {
                return false;
            }
            let legal = path.windows(2).all(|step| {
                let (from, to) = (step[0], step[1]);
                task.map.is_passable(from.0, from.1)
                    && task.map.get_neighbors(from.0, from.1).contains(&to)
            });
            if !legal {
                return false;
            }
        }

        self.detect_conflicts().is_empty()
    }
}

fn aggregate(solutions: &[Rc<Solution>]) -> (usize, usize) {
    let cost = solutions.iter().map(|s| s.cost).sum();
    let time = solutions.iter().map(|s| s.cost).max().unwrap_or(0);
    (cost, time)
}
