use mapf_cbs::common::Task;
use mapf_cbs::config::Config;
use mapf_cbs::error::SolveError;
use mapf_cbs::map::Map;
use mapf_cbs::scenario::Scenario;
use mapf_cbs::solver::{Solver, CBS, CBSH, ICBS, PCBS};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn all_solvers(task: &Task) -> Vec<(&'static str, Box<dyn Solver>)> {
    vec![
        ("cbs", Box::new(CBS::new(task.clone())) as Box<dyn Solver>),
        ("pcbs", Box::new(PCBS::new(task.clone()))),
        ("pcbs-lazy", Box::new(PCBS::lazy(task.clone()))),
        ("cbsh", Box::new(CBSH::new(task.clone()))),
        ("icbs", Box::new(ICBS::new(task.clone()))),
    ]
}

fn assert_all_solve(task: &Task, expected_cost: usize) {
    for (name, mut solver) in all_solvers(task) {
        let node = solver
            .solve(&Config::default())
            .unwrap_or_else(|err| panic!("{name} failed: {err}"));
        assert_eq!(node.sum_of_costs(), expected_cost, "{name}");
        assert!(node.detect_conflicts().is_empty(), "{name}");
        assert!(node.verify(task), "{name}");
        assert!(solver.tree().count_expanded() >= 1, "{name}");
        assert_eq!(solver.stats().costs, expected_cost, "{name}");
    }
}

fn open_grid_task() -> Task {
    let map = Map::from_rows(&["....", "....", "....", "...."]);
    Task::new(map, vec![(0, 0), (3, 0)], vec![(3, 3), (0, 3)])
}

#[test]
fn test_open_grid_two_agents() {
    assert_all_solve(&open_grid_task(), 12);
}

#[test]
fn test_two_separate_crossings() {
    // Two independent crossings, each pair needs one wait. Both root conflicts
    // are cardinal and the conflict graph is a two-edge matching.
    let map = Map::from_rows(&["@.@@@.@", "...@...", "@.@@@.@"]);
    let task = Task::new(
        map,
        vec![(0, 1), (1, 0), (0, 5), (1, 4)],
        vec![(2, 1), (1, 2), (2, 5), (1, 6)],
    );
    assert_all_solve(&task, 10);
}

#[test]
fn test_three_agents_share_a_hub() {
    // Every agent reaches the hub at time 2, so they pass it at times 2, 3
    // and 4 and wait 0 + 1 + 2 steps in total.
    let map = Map::from_rows(&["@@.@@", "@@.@@", ".....", "@@.@@", "@@.@@"]);
    let task = Task::new(
        map,
        vec![(0, 2), (2, 0), (2, 4)],
        vec![(4, 2), (2, 4), (0, 2)],
    );
    assert_all_solve(&task, 15);
}

#[test]
fn test_empty_task_is_invalid() {
    let task = Task::new(Map::from_rows(&["..."]), vec![], vec![]);
    for (name, mut solver) in all_solvers(&task) {
        assert_eq!(
            solver.solve(&Config::default()).unwrap_err(),
            SolveError::TaskInvalid("task has no agents".to_string()),
            "{name}"
        );
        assert!(solver.tree().is_open_empty(), "{name}");
        assert_eq!(solver.tree().count_expanded(), 0, "{name}");
    }
}

#[test]
fn test_cross_forces_a_wait() {
    let map = Map::from_rows(&["@.@", "...", "@.@"]);
    let task = Task::new(map, vec![(0, 1), (1, 0)], vec![(2, 1), (1, 2)]);
    assert_all_solve(&task, 5);
}

#[test]
fn test_corridor_with_pocket() {
    // The agents swap ends of a corridor; one of them must dodge into the pocket.
    let map = Map::from_rows(&["...", "@.@"]);
    let task = Task::new(map, vec![(0, 0), (0, 2)], vec![(0, 2), (0, 0)]);
    assert_all_solve(&task, 7);
}

#[test]
fn test_fixture_map_with_scenario() {
    let map = Map::from_file("map_file/test/test.map").unwrap();
    let scenario = Scenario::load_from_scen("map_file/test/test.scen").unwrap();
    let agents: Vec<_> = scenario.buckets.values().flatten().take(2).collect();
    let task = Task::new(
        map,
        agents.iter().map(|route| route.start).collect(),
        agents.iter().map(|route| route.goal).collect(),
    );

    let mut costs = Vec::new();
    for (name, mut solver) in all_solvers(&task) {
        let node = solver.solve(&Config::default()).unwrap();
        assert!(node.verify(&task), "{name}");
        costs.push(node.sum_of_costs());
    }
    assert!(costs.windows(2).all(|pair| pair[0] == pair[1]), "{costs:?}");
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let task = open_grid_task();
    for (name, mut solver) in all_solvers(&task) {
        let first = solver.solve(&Config::default()).unwrap();
        let expanded = solver.tree().count_expanded();
        let second = solver.solve(&Config::default()).unwrap();
        assert_eq!(first.sum_of_costs(), second.sum_of_costs(), "{name}");
        assert_eq!(first.paths(), second.paths(), "{name}");
        assert_eq!(solver.tree().count_expanded(), expanded, "{name}");
    }
}

#[test]
fn test_blocked_goal_fails_at_root() {
    let map = Map::from_rows(&["...", ".@.", "..."]);
    let task = Task::new(map, vec![(0, 0), (2, 2)], vec![(2, 0), (1, 1)]);
    for (name, mut solver) in all_solvers(&task) {
        assert_eq!(
            solver.solve(&Config::default()).unwrap_err(),
            SolveError::PlannerFailure { agent: 1 },
            "{name}"
        );
        assert_eq!(solver.tree().count_expanded(), 0, "{name}");
    }
}

#[test]
fn test_invalid_task_leaves_tree_untouched() {
    let map = Map::from_rows(&["...", "...", "..."]);
    let task = Task::new(map, vec![(0, 0), (0, 0)], vec![(2, 2), (2, 0)]);
    for (name, mut solver) in all_solvers(&task) {
        let err = solver.solve(&Config::default()).unwrap_err();
        assert!(matches!(err, SolveError::TaskInvalid(_)), "{name}");
        assert!(solver.tree().is_open_empty(), "{name}");
        assert_eq!(solver.tree().count_expanded(), 0, "{name}");
        assert_eq!(solver.tree().count_closed(), 0, "{name}");
    }
}

#[test]
fn test_time_limit_stops_unsolvable_search() {
    // Two agents must swap along a corridor without room to pass.
    let map = Map::from_rows(&["..."]);
    let task = Task::new(map, vec![(0, 0), (0, 2)], vec![(0, 2), (0, 0)]);
    let config = Config {
        time_limit_ms: Some(200),
        ..Config::default()
    };
    let mut solver = CBS::new(task);
    assert_eq!(solver.solve(&config).unwrap_err(), SolveError::TimedOut);
    assert!(solver.tree().count_expanded() > 0);
}

#[test]
fn test_cancel_flag_stops_search() {
    let cancel = Arc::new(AtomicBool::new(true));
    let mut solver = ICBS::new(open_grid_task()).with_cancel_flag(cancel);
    assert_eq!(
        solver.solve(&Config::default()).unwrap_err(),
        SolveError::Cancelled
    );
    // The root was built before the check, nothing was expanded.
    assert_eq!(solver.tree().count_expanded(), 0);
    assert_eq!(solver.tree().open_len(), 1);
}
