use mapf_cbs::common::{Agent, Path, Task};
use mapf_cbs::config::{Cli, Config};
use mapf_cbs::map::Map;
use mapf_cbs::scenario::Scenario;
use mapf_cbs::solver::{run_solver, Solver, CBS, CBSH, ICBS, PCBS};
use mapf_cbs::stat::Stats;

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct SolverOutput {
    solver: String,
    solved: bool,
    error: Option<String>,
    cost: Option<usize>,
    makespan: Option<usize>,
    paths: Vec<Path>,
    expanded_nodes: usize,
    stats: Stats,
}

fn load_agents(config: &Config) -> anyhow::Result<Vec<Agent>> {
    if let Some(agents_path) = &config.agents_path {
        return Scenario::load_agents_from_yaml(agents_path);
    }

    let scenario = Scenario::load_from_scen(&config.scen_path)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    if config.agents_dist.is_empty() {
        scenario.generate_agents_randomly(config.num_agents, &mut rng)
    } else {
        scenario.generate_agents_by_buckets(config.num_agents, &config.agents_dist, &mut rng)
    }
}

fn build_solver(name: &str, task: Task) -> Box<dyn Solver> {
    match name {
        "pcbs" => Box::new(PCBS::new(task)),
        "pcbs-lazy" => Box::new(PCBS::lazy(task)),
        "cbsh" => Box::new(CBSH::new(task)),
        "icbs" => Box::new(ICBS::new(task)),
        _ => Box::new(CBS::new(task)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Map::from_file(&config.map_path)?;
    let agents = load_agents(&config)?;
    for agent in &agents {
        if !agent.verify(&map) {
            bail!("agent {} has a blocked start or goal", agent.id);
        }
    }
    let task = Task::from_agents(map, &agents);

    let solver_names: Vec<&str> = if config.solver == "all" {
        vec!["cbs", "pcbs", "pcbs-lazy", "cbsh", "icbs"]
    } else {
        vec![config.solver.as_str()]
    };

    let mut outputs = Vec::with_capacity(solver_names.len());
    for name in solver_names {
        let mut solver = build_solver(name, task.clone());
        let result = run_solver(solver.as_mut(), name, &config);

        let output = match result {
            Ok(node) => {
                if !node.verify(&task) {
                    error!("{name} returned an invalid solution");
                }
                SolverOutput {
                    solver: name.to_string(),
                    solved: true,
                    error: None,
                    cost: Some(node.sum_of_costs()),
                    makespan: Some(node.makespan()),
                    paths: node.paths(),
                    expanded_nodes: solver.tree().count_expanded(),
                    stats: solver.stats().clone(),
                }
            }
            Err(err) => SolverOutput {
                solver: name.to_string(),
                solved: false,
                error: Some(err.to_string()),
                cost: None,
                makespan: None,
                paths: Vec::new(),
                expanded_nodes: solver.tree().count_expanded(),
                stats: solver.stats().clone(),
            },
        };
        outputs.push(output);
    }

    if let Some(output_path) = &config.output_path {
        let json = serde_json::to_string_pretty(&outputs)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("cannot write output: {output_path}"))?;
        info!("Wrote results to {output_path}");
    }

    Ok(())
}
