//! Configuration for repair sessions
//!
//! A repair config lists the nodes taking part in a repair and the
//! datacenter each one lives in. It is read from a TOML file with
//! `DCREPAIR_`-prefixed environment variables layered on top.

use crate::common::{Error, Result};
use crate::coordinator::{RepairParallelism, StaticTopology};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Repair session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// How requests are sequenced across nodes
    #[serde(default)]
    pub parallelism: RepairParallelism,

    /// Datacenter assigned to nodes missing from `nodes`
    #[serde(default = "default_datacenter")]
    pub default_datacenter: String,

    /// Nodes to repair, in submission order
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Knobs for `dcrepair simulate`
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// A single repair target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node address (e.g. `10.0.0.1:7000`)
    pub address: String,

    /// Datacenter the node belongs to
    pub datacenter: String,
}

/// Simulated executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_min_latency")]
    pub min_latency_ms: u64,

    #[serde(default = "default_max_latency")]
    pub max_latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated request fails
    #[serde(default)]
    pub fail_rate: f64,
}

fn default_datacenter() -> String {
    "dc1".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_min_latency() -> u64 {
    10
}
fn default_max_latency() -> u64 {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency(),
            max_latency_ms: default_max_latency(),
            fail_rate: 0.0,
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            parallelism: RepairParallelism::default(),
            default_datacenter: default_datacenter(),
            nodes: Vec::new(),
            log_level: default_log_level(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RepairConfig {
    /// Load config from a TOML file, applying environment overrides
    /// (`DCREPAIR_PARALLELISM=parallel`, `DCREPAIR_SIMULATION__FAIL_RATE=0.1`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix("DCREPAIR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: RepairConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from an in-memory TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        let config: RepairConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot describe a valid repair
    pub fn validate(&self) -> Result<()> {
        if self.default_datacenter.trim().is_empty() {
            return Err(Error::InvalidConfig("default_datacenter is empty".into()));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.address.trim().is_empty() {
                return Err(Error::InvalidConfig("node with empty address".into()));
            }
            if node.datacenter.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "node {} has an empty datacenter",
                    node.address
                )));
            }
            if !seen.insert(node.address.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "node {} listed more than once",
                    node.address
                )));
            }
        }

        let sim = &self.simulation;
        if sim.min_latency_ms > sim.max_latency_ms {
            return Err(Error::InvalidConfig(format!(
                "min_latency_ms ({}) exceeds max_latency_ms ({})",
                sim.min_latency_ms, sim.max_latency_ms
            )));
        }
        if !(0.0..=1.0).contains(&sim.fail_rate) {
            return Err(Error::InvalidConfig(format!(
                "fail_rate must be within [0, 1], got {}",
                sim.fail_rate
            )));
        }

        Ok(())
    }

    /// Node addresses in submission order
    pub fn targets(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.address.clone()).collect()
    }

    /// Build the node → datacenter lookup described by this config
    pub fn topology(&self) -> StaticTopology {
        self.nodes.iter().fold(
            StaticTopology::new(self.default_datacenter.clone()),
            |topology, node| topology.with_node(node.address.clone(), node.datacenter.clone()),
        )
    }
}
