mod cbs;
mod cbsh;
mod heuristic;
mod icbs;
mod pcbs;
mod selector;
mod tree;

pub use cbs::CBS;
pub use cbsh::CBSH;
pub use icbs::ICBS;
pub use pcbs::PCBS;
pub use tree::SearchTree;

use crate::algorithm::a_star_search;
use crate::common::{
    Agent, AgentConstraints, ConstraintSet, HighLevelNode, MddRequest, Solution, Task,
};
use crate::config::Config;
use crate::error::SolveError;
use crate::map::Map;
use crate::stat::Stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub trait Solver {
    /// Runs a fresh search. The search tree and stats of the run stay
    /// available through `tree` and `stats`, also when the run fails.
    fn solve(&mut self, config: &Config) -> Result<HighLevelNode, SolveError>;

    fn tree(&self) -> &SearchTree;

    fn stats(&self) -> &Stats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConflictSelector {
    FirstFound,
    /// Cardinal conflicts first. `lazy` computes counted MDDs only when a
    /// conflict needs them instead of on every replan.
    Prioritized { lazy: bool },
}

/// What distinguishes one CBS variant from another.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Strategy {
    pub name: &'static str,
    pub request: MddRequest,
    pub selector: ConflictSelector,
    pub heuristic: bool,
}

/// Replans single agents of a task. Distance tables are built once per solve.
pub(crate) struct Planner<'a> {
    map: &'a Map,
    agents: Vec<Agent>,
    heuristics: Vec<Vec<Vec<usize>>>,
}

impl<'a> Planner<'a> {
    pub(crate) fn new(task: &'a Task) -> Self {
        let agents = task.agents();
        let heuristics = agents
            .iter()
            .map(|agent| task.map.heuristic_dji(agent.goal))
            .collect();
        Planner {
            map: &task.map,
            agents,
            heuristics,
        }
    }

    pub(crate) fn plan(
        &self,
        constraints: &ConstraintSet,
        agent: usize,
        request: MddRequest,
        stats: &mut Stats,
    ) -> Option<Solution> {
        let agent = &self.agents[agent];
        let indexed = AgentConstraints::new(constraints, agent.id, agent.goal);
        a_star_search(
            self.map,
            agent,
            &self.heuristics[agent.id],
            &indexed,
            request,
            stats,
        )
    }
}

/// The loop shared by every variant.
#[instrument(skip_all, name = "high_level_search", fields(solver = strategy.name))]
pub(crate) fn search(
    task: &Task,
    strategy: Strategy,
    config: &Config,
    cancel: Option<&AtomicBool>,
    tree: &mut SearchTree,
    stats: &mut Stats,
) -> Result<HighLevelNode, SolveError> {
    let total_solve_start_time = Instant::now();
    task.validate()?;

    let planner = Planner::new(task);
    let mut solutions = Vec::with_capacity(task.num_agents());
    for agent in 0..task.num_agents() {
        match planner.plan(&ConstraintSet::new(), agent, strategy.request, stats) {
            Some(solution) => solutions.push(solution),
            None => {
                warn!("agent {agent} has no path, no root node");
                return Err(SolveError::PlannerFailure { agent });
            }
        }
    }
    tree.add_to_open(HighLevelNode::new(solutions));
    stats.high_level_generate_nodes += 1;

    let time_limit = config.time_limit();
    loop {
        if time_limit.is_some_and(|limit| total_solve_start_time.elapsed() >= limit) {
            warn!("time limit reached after {} expansions", tree.count_expanded());
            return Err(SolveError::TimedOut);
        }
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!("cancelled after {} expansions", tree.count_expanded());
            return Err(SolveError::Cancelled);
        }

        let Some(mut current_node) = tree.pop_best() else {
            warn!("open list exhausted");
            return Err(SolveError::OpenExhausted);
        };
        stats.high_level_expand_nodes += 1;

        let conflicts = current_node.detect_conflicts();
        if conflicts.is_empty() {
            stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
            stats.costs = current_node.sum_of_costs();
            stats.print(strategy.name);
            return Ok(current_node);
        }

        let conflict = match strategy.selector {
            ConflictSelector::FirstFound => conflicts[0].clone(),
            ConflictSelector::Prioritized { lazy } => {
                selector::select_prioritized(&mut current_node, &conflicts, &planner, lazy, stats)
            }
        };
        debug!("cost {} conflict: {conflict:?}", current_node.cost());

        let (agent_1, agent_2) = conflict.agents();
        for agent in [agent_1, agent_2] {
            let constraint = conflict.to_constraint(agent);
            let constraints = current_node.constraints().with(constraint.clone());
            if tree.was_expanded(&constraints) {
                stats.high_level_duplicate_nodes += 1;
                continue;
            }

            let Some(solution) = planner.plan(&constraints, agent, strategy.request, stats)
            else {
                debug!("agent {agent} cannot satisfy {constraint:?}, prune child");
                continue;
            };

            let mut child = current_node.child(constraint, solution);
            if strategy.heuristic {
                let h_cost = heuristic::graph_cover_heuristic(&child);
                child = child.with_heuristic(h_cost);
            }
            tree.add_to_open(child);
            stats.high_level_generate_nodes += 1;
        }

        tree.add_to_closed(&current_node);
    }
}

/// Runs `solver` and logs the outcome the same way for every variant.
pub fn run_solver(
    solver: &mut dyn Solver,
    name: &str,
    config: &Config,
) -> Result<HighLevelNode, SolveError> {
    let result = solver.solve(config);
    match &result {
        Ok(node) => info!("{name} found cost {} makespan {}", node.sum_of_costs(), node.makespan()),
        Err(err) => info!(
            "{name} failed: {err}, expanded {} nodes",
            solver.tree().count_expanded()
        ),
    }
    result
}
