use anyhow::{anyhow, bail, Context, Result};
use rand::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use tracing::info;

use crate::common::Agent;

/// One line of a MovingAI scenario, already converted to (row, column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

type Bucket = Vec<Route>;

#[derive(Debug, Default)]
pub struct Scenario {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    pub buckets: BTreeMap<usize, Bucket>,
}

impl Scenario {
    pub fn load_from_scen(path: &str) -> Result<Scenario> {
        let file = File::open(path).with_context(|| format!("cannot open scenario {path}"))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("invalid scenario {path}"))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Scenario> {
        let mut lines = reader.lines();

        // First line is "version x"
        let version = lines.next().ok_or_else(|| anyhow!("empty scenario"))??;
        if !version.starts_with("version") {
            bail!("expected a version line, found {version:?}");
        }

        let mut scenario = Scenario::default();
        for (line_number, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 8 {
                bail!(
                    "line {}: expected at least 8 columns, found {}",
                    line_number + 2,
                    parts.len()
                );
            }
            let field = |index: usize| -> Result<usize> {
                parts[index]
                    .parse()
                    .with_context(|| format!("line {}: bad column {index}", line_number + 2))
            };

            // Columns are x (column) before y (row).
            let route = Route {
                start: (field(5)?, field(4)?),
                goal: (field(7)?, field(6)?),
            };

            if scenario.map.is_empty() {
                scenario.map = parts[1].to_string();
                scenario.map_width = field(2)?;
                scenario.map_height = field(3)?;
            }

            scenario.buckets.entry(field(0)?).or_default().push(route);
        }

        Ok(scenario)
    }

    /// One agent per entry of `agent_buckets`, each taking an unused route of
    /// its bucket at random.
    pub fn generate_agents_by_buckets<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        agent_buckets: &[usize],
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        if agent_buckets.len() != num_agents {
            bail!("Number of agents does not match the length of agent_buckets");
        }

        let mut agents: Vec<Agent> = Vec::with_capacity(num_agents);
        let mut used_routes: HashSet<(usize, usize)> = HashSet::new();

        for (agent_id, &bucket_index) in agent_buckets.iter().enumerate() {
            let bucket = self
                .buckets
                .get(&bucket_index)
                .ok_or_else(|| anyhow!("Bucket {bucket_index} not found"))?;

            let available_routes: Vec<usize> = (0..bucket.len())
                .filter(|&idx| !used_routes.contains(&(bucket_index, idx)))
                .collect();

            let &route_index = available_routes
                .choose(rng)
                .ok_or_else(|| anyhow!("No available routes left in bucket {bucket_index}"))?;

            let route = &bucket[route_index];
            agents.push(Agent {
                id: agent_id,
                start: route.start,
                goal: route.goal,
            });
            used_routes.insert((bucket_index, route_index));
        }

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    /// `num_agents` distinct routes drawn from all buckets.
    pub fn generate_agents_randomly<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        let mut available_routes: Vec<&Route> = self.buckets.values().flatten().collect();
        available_routes.sort();
        available_routes.dedup();

        if available_routes.len() < num_agents {
            bail!(
                "Only {} unique routes available for {num_agents} agents",
                available_routes.len()
            );
        }

        available_routes.shuffle(rng);
        let agents: Vec<Agent> = available_routes
            .into_iter()
            .take(num_agents)
            .enumerate()
            .map(|(id, route)| Agent {
                id,
                start: route.start,
                goal: route.goal,
            })
            .collect();

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Vec<Agent>> {
        let file = File::open(path).with_context(|| format!("cannot open agents {path}"))?;
        let reader = BufReader::new(file);
        let agents = serde_yaml::from_reader(reader)
            .with_context(|| format!("invalid agents yaml {path}"))?;
        Ok(agents)
    }

    pub fn write_agents_to_yaml(path: &str, agents: &[Agent]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(&agents)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SCEN: &str = "map_file/test/test.scen";

    #[test]
    fn test_read_scenario() {
        let scen = Scenario::load_from_scen(SCEN).unwrap();
        assert_eq!(scen.map, "test.map");
        assert_eq!((scen.map_width, scen.map_height), (5, 5));
        assert_eq!(scen.buckets.len(), 2);
        assert_eq!(
            scen.buckets[&0][1],
            Route {
                start: (1, 3),
                goal: (3, 1),
            }
        );
    }

    #[test]
    fn test_generate_agents_by_buckets() {
        let scen = Scenario::load_from_scen(SCEN).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let agents = scen
            .generate_agents_by_buckets(2, &[0, 0], &mut rng)
            .unwrap();
        assert_eq!(agents.len(), 2);
        assert_ne!(agents[0], agents[1]);
        assert_eq!(agents[1].id, 1);
        assert!(scen.buckets[&0]
            .iter()
            .any(|route| route.start == agents[0].start && route.goal == agents[0].goal));

        // Bucket 0 has only two routes.
        assert!(scen
            .generate_agents_by_buckets(3, &[0, 0, 0], &mut rng)
            .is_err());
        assert!(scen.generate_agents_by_buckets(1, &[7], &mut rng).is_err());
        assert!(scen.generate_agents_by_buckets(2, &[0], &mut rng).is_err());
    }

    #[test]
    fn test_generate_agents_randomly_is_seeded() {
        let scen = Scenario::load_from_scen(SCEN).unwrap();
        let first = scen
            .generate_agents_randomly(3, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let second = scen
            .generate_agents_randomly(3, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(first, second);
        assert!(scen
            .generate_agents_randomly(5, &mut StdRng::seed_from_u64(42))
            .is_err());
    }

    #[test]
    fn test_rejects_missing_version() {
        let input = "0\ttest.map\t5\t5\t1\t1\t3\t3\t4.0\n";
        assert!(Scenario::from_reader(input.as_bytes()).is_err());
    }

    #[test]
    fn test_agents_yaml_round_trip() {
        let path = std::env::temp_dir().join("mapf_cbs_agents.yaml");
        let path = path.to_str().unwrap();
        let agents = vec![Agent {
            id: 0,
            start: (1, 1),
            goal: (3, 3),
        }];
        Scenario::write_agents_to_yaml(path, &agents).unwrap();
        assert_eq!(Scenario::load_agents_from_yaml(path).unwrap(), agents);
    }
}
