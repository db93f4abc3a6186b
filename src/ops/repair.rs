//! Run a repair session against a set of nodes
//!
//! The session owns the coordinator and is its only writer: dispatched
//! targets arrive over a channel, each one runs on the tokio runtime, and
//! completions are fed back into the coordinator one at a time from the
//! session loop.

use crate::common::{Error, RepairConfig, Result};
use crate::coordinator::{RepairParallelism, RequestCoordinator, Topology};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::{self, JoinSet};

/// Drives one coordinator to completion
pub struct RepairSession<T> {
    parallelism: RepairParallelism,
    coordinator: Box<dyn RequestCoordinator<T> + Send>,
    dispatched: UnboundedReceiver<T>,
}

impl<T> RepairSession<T>
where
    T: Clone + Eq + Hash + Debug + Display + Send + 'static,
{
    pub fn new<S>(parallelism: RepairParallelism, topology: S) -> Self
    where
        S: Topology<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            parallelism,
            coordinator: parallelism.coordinator(tx, topology),
            dispatched: rx,
        }
    }

    /// Register a node for repair
    pub fn add_target(&mut self, target: T) -> Result<()> {
        self.coordinator.add(target)
    }

    /// Targets registered so far
    pub fn len(&self) -> usize {
        self.coordinator.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every target through `executor`, honouring the coordinator's
    /// sequencing. A failed or panicking executor still counts as
    /// completed; it is recorded in the report and never retried.
    pub async fn run<F, Fut>(mut self, executor: F) -> RepairReport<T>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let started_at = Instant::now();
        let total = self.coordinator.remaining();
        tracing::info!(parallelism = %self.parallelism, total, "Starting repair session");

        let mut report = RepairReport {
            parallelism: self.parallelism,
            total,
            succeeded: 0,
            failed: Vec::new(),
            dispatch_order: Vec::with_capacity(total),
            elapsed_ms: 0,
        };

        // Requests live in the JoinSet, so dropping the session aborts them.
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<task::Id, T> = HashMap::new();
        let mut remaining = total;
        self.coordinator.start();

        loop {
            while let Ok(target) = self.dispatched.try_recv() {
                report.dispatch_order.push(target.clone());
                let handle = tasks.spawn(executor(target.clone()));
                in_flight.insert(handle.id(), target);
            }

            if remaining == 0 {
                break;
            }

            let (id, outcome) = match tasks.join_next_with_id().await {
                Some(Ok((id, result))) => (id, result.map_err(|e| e.to_string())),
                Some(Err(e)) => (e.id(), Err(format!("executor aborted: {}", e))),
                None => panic!("{} targets pending but nothing in flight", remaining),
            };
            let target = match in_flight.remove(&id) {
                Some(target) => target,
                None => panic!("completion from unknown repair task {}", id),
            };

            match outcome {
                Ok(()) => {
                    tracing::debug!(node = %target, "repair request completed");
                    report.succeeded += 1;
                }
                Err(reason) => {
                    tracing::warn!(node = %target, %reason, "repair request failed");
                    report.failed.push(FailedRepair {
                        target: target.clone(),
                        reason,
                    });
                }
            }

            remaining = self.coordinator.completed(&target);
        }

        report.elapsed_ms = started_at.elapsed().as_millis() as u64;
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "Repair session finished"
        );
        report
    }
}

/// Outcome of a repair session
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport<T> {
    pub parallelism: RepairParallelism,
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedRepair<T>>,
    /// Targets in the order they were handed to the executor
    pub dispatch_order: Vec<T>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRepair<T> {
    pub target: T,
    pub reason: String,
}

impl<T: Display> RepairReport<T> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Surface the first failure as an error
    pub fn into_result(self) -> Result<Self> {
        match self.failed.first() {
            Some(failure) => Err(Error::RepairFailed {
                target: failure.target.to_string(),
                reason: failure.reason.clone(),
            }),
            None => Ok(self),
        }
    }
}

/// Repair every node listed in `config`
pub async fn repair_cluster<F, Fut>(
    config: &RepairConfig,
    executor: F,
) -> Result<RepairReport<String>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let mut session = RepairSession::new(config.parallelism, config.topology());
    for target in config.targets() {
        session.add_target(target)?;
    }
    Ok(session.run(executor).await)
}
