//! Dry-run dispatch planning
//!
//! Replays a coordinator assuming every in-flight request finishes at the
//! same time, which groups targets into waves: wave `k` is everything
//! dispatched once waves `0..k` have completed.

use crate::common::{RepairConfig, Result};
use crate::coordinator::{RepairParallelism, Topology};
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
pub struct RepairPlan<T> {
    pub parallelism: RepairParallelism,
    pub waves: Vec<Wave<T>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Wave<T> {
    pub targets: Vec<WaveTarget<T>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaveTarget<T> {
    pub target: T,
    pub datacenter: String,
}

impl<T> RepairPlan<T> {
    /// Largest number of requests in flight at once
    pub fn max_concurrency(&self) -> usize {
        self.waves.iter().map(|w| w.targets.len()).max().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.waves.iter().map(|w| w.targets.len()).sum()
    }
}

/// Group `targets` into dispatch waves under `parallelism`
pub fn plan_waves<T, S>(
    parallelism: RepairParallelism,
    topology: S,
    targets: impl IntoIterator<Item = T>,
) -> Result<RepairPlan<T>>
where
    T: Clone + Eq + Hash + Debug + Send,
    S: Topology<T> + Clone + Send,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = parallelism.coordinator(tx, topology.clone());
    for target in targets {
        coordinator.add(target)?;
    }
    coordinator.start();

    let mut waves = Vec::new();
    loop {
        let mut wave = Vec::new();
        while let Ok(target) = rx.try_recv() {
            wave.push(target);
        }
        if wave.is_empty() {
            break;
        }
        for target in &wave {
            coordinator.completed(target);
        }
        waves.push(Wave {
            targets: wave
                .into_iter()
                .map(|target| WaveTarget {
                    datacenter: topology.datacenter(&target),
                    target,
                })
                .collect(),
        });
    }

    Ok(RepairPlan { parallelism, waves })
}

/// Plan the nodes listed in `config`
pub fn plan_cluster(config: &RepairConfig) -> Result<RepairPlan<String>> {
    plan_waves(config.parallelism, config.topology(), config.targets())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::StaticTopology;

    fn topology() -> StaticTopology {
        StaticTopology::new("dc1")
            .with_node("a1", "dc1")
            .with_node("a2", "dc1")
            .with_node("a3", "dc1")
            .with_node("b1", "dc2")
    }

    fn targets() -> Vec<String> {
        ["a1", "a2", "b1", "a3"].iter().map(|s| s.to_string()).collect()
    }

    fn names(plan: &RepairPlan<String>) -> Vec<Vec<&str>> {
        plan.waves
            .iter()
            .map(|w| w.targets.iter().map(|t| t.target.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_datacenter_aware_waves() {
        let plan = plan_waves(RepairParallelism::DatacenterAware, topology(), targets()).unwrap();
        assert_eq!(names(&plan), vec![vec!["a1", "b1"], vec!["a2"], vec!["a3"]]);
        assert_eq!(plan.max_concurrency(), 2);
        assert_eq!(plan.total(), 4);
        assert_eq!(plan.waves[0].targets[1].datacenter, "dc2");
    }

    #[test]
    fn test_sequential_waves() {
        let plan = plan_waves(RepairParallelism::Sequential, topology(), targets()).unwrap();
        assert_eq!(plan.waves.len(), 4);
        assert_eq!(plan.max_concurrency(), 1);
    }

    #[test]
    fn test_parallel_waves() {
        let plan = plan_waves(RepairParallelism::Parallel, topology(), targets()).unwrap();
        assert_eq!(names(&plan), vec![vec!["a1", "a2", "b1", "a3"]]);
    }

    #[test]
    fn test_duplicate_target_fails_plan() {
        let result = plan_waves(
            RepairParallelism::DatacenterAware,
            topology(),
            vec!["a1".to_string(), "a1".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_plan() {
        let plan =
            plan_waves(RepairParallelism::DatacenterAware, topology(), Vec::<String>::new())
                .unwrap();
        assert!(plan.waves.is_empty());
        assert_eq!(plan.max_concurrency(), 0);
    }
}
