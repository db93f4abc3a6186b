//! Request coordinators for repair sessions
//!
//! A coordinator decides *when* each repair target is handed to the
//! processor:
//! - Sequential: one request in flight across the whole cluster
//! - Parallel: every request dispatched at once
//! - Datacenter-aware: one request in flight per datacenter
//!
//! Coordinators are single-writer. The owner serialises `add`, `start`
//! and `completed` calls (see [`crate::ops::RepairSession`]).

pub mod datacenter_aware;
pub mod parallel;
pub mod processor;
pub mod sequential;
pub mod topology;

pub use datacenter_aware::DatacenterAwareCoordinator;
pub use parallel::ParallelCoordinator;
pub use processor::RequestProcessor;
pub use sequential::SequentialCoordinator;
pub use topology::{StaticTopology, Topology};

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

/// Sequencing contract shared by all coordinators.
///
/// Lifecycle: `add`* → `start` → `completed`* until it returns 0.
pub trait RequestCoordinator<T> {
    /// Register a target. Never dispatches.
    fn add(&mut self, target: T) -> Result<()>;

    /// Dispatch the initial set of targets. Must be called exactly once.
    fn start(&mut self);

    /// Mark a dispatched target as done, dispatching its successor if any.
    /// Returns the number of targets still pending.
    ///
    /// # Panics
    ///
    /// If `target` is not currently in flight.
    fn completed(&mut self, target: &T) -> usize;

    /// Targets added but not yet completed
    fn remaining(&self) -> usize;
}

/// How repair requests are spread over the cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairParallelism {
    #[serde(rename = "sequential")]
    Sequential,
    #[serde(rename = "parallel")]
    Parallel,
    #[default]
    #[serde(rename = "dc_parallel")]
    DatacenterAware,
}

impl RepairParallelism {
    /// Build a coordinator of this kind.
    ///
    /// The topology is only consulted by the datacenter-aware coordinator.
    pub fn coordinator<'a, T, P, S>(
        self,
        processor: P,
        topology: S,
    ) -> Box<dyn RequestCoordinator<T> + Send + 'a>
    where
        T: Clone + Eq + Hash + Debug + Send + 'a,
        P: RequestProcessor<T> + Send + 'a,
        S: Topology<T> + Send + 'a,
    {
        match self {
            RepairParallelism::Sequential => Box::new(SequentialCoordinator::new(processor)),
            RepairParallelism::Parallel => Box::new(ParallelCoordinator::new(processor)),
            RepairParallelism::DatacenterAware => {
                Box::new(DatacenterAwareCoordinator::new(processor, topology))
            }
        }
    }
}

impl std::fmt::Display for RepairParallelism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairParallelism::Sequential => write!(f, "sequential"),
            RepairParallelism::Parallel => write!(f, "parallel"),
            RepairParallelism::DatacenterAware => write!(f, "dc_parallel"),
        }
    }
}

impl FromStr for RepairParallelism {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(RepairParallelism::Sequential),
            "parallel" => Ok(RepairParallelism::Parallel),
            "dc_parallel" | "dc-parallel" | "datacenter_aware" => {
                Ok(RepairParallelism::DatacenterAware)
            }
            other => Err(Error::InvalidConfig(format!(
                "unknown repair parallelism: {}",
                other
            ))),
        }
    }
}
