//! JSON run file: simulation settings, network, globals, and population.
//!
//! ```json
//! {
//!   "sim":        { "name": "sir", "interval": 1.0, "max_time": 50, "seed": 42 },
//!   "network":    { "type": "erdos_renyi", "nodes": 200, "p": 0.03 },
//!   "globals":    { "infection_prob": 0.2, "recovery_time": 7.0 },
//!   "population": [
//!     { "kind": "person", "weight": 0.98 },
//!     { "kind": "person", "weight": 0.02, "state": { "state_id": "infected" } },
//!     { "kind": "seeder", "count": 1 }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use sn_core::{PopulationSpec, SimConfig, SimRng, State};
use sn_graph::{generators, Graph};

/// Salt mixed into the trial seed for network generation, so the topology
/// does not share a stream with any agent RNG.
const NETWORK_SALT: u64 = 0x6E65_7477_6F72_6B00;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    #[serde(default)]
    pub sim:        SimConfig,
    pub network:    NetworkSpec,
    #[serde(default)]
    pub globals:    State,
    pub population: Vec<PopulationSpec>,
}

/// Which generator builds the topology.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkSpec {
    Complete { nodes: usize },
    Path { nodes: usize },
    Star { nodes: usize },
    ErdosRenyi { nodes: usize, p: f64 },
}

impl NetworkSpec {
    /// Build the graph for `trial`.  Random generators draw from a stream
    /// derived from the trial seed.
    pub fn build(&self, config: &SimConfig, trial: usize) -> Graph {
        match *self {
            NetworkSpec::Complete { nodes } => generators::complete(nodes),
            NetworkSpec::Path { nodes } => generators::path(nodes),
            NetworkSpec::Star { nodes } => generators::star(nodes),
            NetworkSpec::ErdosRenyi { nodes, p } => {
                let mut rng = SimRng::new(config.trial_seed(trial) ^ NETWORK_SALT);
                generators::erdos_renyi(nodes, p, &mut rng)
            }
        }
    }

    pub fn nodes(&self) -> usize {
        match *self {
            NetworkSpec::Complete { nodes }
            | NetworkSpec::Path { nodes }
            | NetworkSpec::Star { nodes }
            | NetworkSpec::ErdosRenyi { nodes, .. } => nodes,
        }
    }
}

impl RunFile {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let run: RunFile = serde_json::from_reader(reader).context("malformed run file")?;
        run.validate()?;
        Ok(run)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_reader(BufReader::new(file)).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.sim.validate()?;
        if let NetworkSpec::ErdosRenyi { p, .. } = self.network {
            anyhow::ensure!((0.0..=1.0).contains(&p), "edge probability must be in [0, 1], got {p}");
        }
        anyhow::ensure!(!self.population.is_empty(), "population must list at least one entry");
        Ok(())
    }
}
