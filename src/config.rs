use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;
use std::time::Duration;

pub const SOLVERS: [&str; 6] = ["cbs", "pcbs", "pcbs-lazy", "cbsh", "icbs", "all"];

#[derive(Parser, Debug)]
#[command(
    name = "MAPF CBS",
    about = "Optimal multi-agent path finding with the Conflict-Based Search family.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the MovingAI scenario file")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path to a YAML list of agents, takes precedence over the scenario")]
    pub agents_path: Option<String>,

    #[arg(long, help = "Number of agents")]
    pub num_agents: Option<usize>,

    #[arg(long, help = "Scenario bucket of every agent", use_value_delimiter = true)]
    pub agents_dist: Vec<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Solver to use: cbs, pcbs, pcbs-lazy, cbsh, icbs or all")]
    pub solver: Option<String>,

    #[arg(long, help = "Abort the search after this many milliseconds")]
    pub time_limit_ms: Option<u64>,

    #[arg(long, help = "Write the solution and stats as JSON to this path")]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_path: String,
    pub scen_path: String,
    pub agents_path: Option<String>,
    pub num_agents: usize,
    pub agents_dist: Vec<usize>,
    pub seed: u64,
    pub solver: String,
    pub time_limit_ms: Option<u64>,
    pub output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/test.map".to_string(),
            scen_path: "map_file/test/test.scen".to_string(),
            agents_path: None,
            num_agents: 2,
            agents_dist: Vec::new(),
            seed: 0,
            solver: "cbs".to_string(),
            time_limit_ms: None,
            output_path: None,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config yaml")
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = scen_path.clone();
        }
        if cli.agents_path.is_some() {
            self.agents_path = cli.agents_path.clone();
        }
        if let Some(num_agents) = cli.num_agents {
            self.num_agents = num_agents;
        }
        if !cli.agents_dist.is_empty() {
            self.agents_dist = cli.agents_dist.clone();
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(solver) = &cli.solver {
            self.solver = solver.clone();
        }
        if cli.time_limit_ms.is_some() {
            self.time_limit_ms = cli.time_limit_ms;
        }
        if cli.output_path.is_some() {
            self.output_path = cli.output_path.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !SOLVERS.contains(&self.solver.as_str()) {
            return Err(anyhow!(
                "Unknown solver {:?}, expected one of {:?}",
                self.solver,
                SOLVERS
            ));
        }

        if self.num_agents == 0 {
            return Err(anyhow!("Number of agents must be positive"));
        }

        if !self.agents_dist.is_empty() && self.agents_dist.len() != self.num_agents {
            return Err(anyhow!(
                "Agents distribution has {} entries, expected {}",
                self.agents_dist.len(),
                self.num_agents
            ));
        }

        if self.time_limit_ms == Some(0) {
            return Err(anyhow!("Time limit must be positive"));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}
