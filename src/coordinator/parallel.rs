//! Every repair request in flight at once

use crate::common::{Error, Result};
use crate::coordinator::{RequestCoordinator, RequestProcessor};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Dispatches all targets at `start` and accepts completions in any order.
pub struct ParallelCoordinator<T, P> {
    /// Submission order, used for dispatch
    order: Vec<T>,
    pending: HashSet<T>,
    started: bool,
    processor: P,
}

impl<T, P> ParallelCoordinator<T, P>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
{
    pub fn new(processor: P) -> Self {
        Self {
            order: Vec::new(),
            pending: HashSet::new(),
            started: false,
            processor,
        }
    }

    pub fn is_pending(&self, target: &T) -> bool {
        self.pending.contains(target)
    }
}

impl<T, P> RequestCoordinator<T> for ParallelCoordinator<T, P>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
{
    fn add(&mut self, target: T) -> Result<()> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        if !self.pending.insert(target.clone()) {
            return Err(Error::DuplicateTarget(format!("{:?}", target)));
        }
        self.order.push(target);
        Ok(())
    }

    fn start(&mut self) {
        assert!(!self.started, "coordinator started twice");
        self.started = true;

        for target in self.order.drain(..) {
            tracing::debug!(node = ?target, "dispatching");
            self.processor.process(&target);
        }
    }

    fn completed(&mut self, target: &T) -> usize {
        assert!(self.started, "completed({:?}) called before start", target);
        let removed = self.pending.remove(target);
        assert!(removed, "completed({:?}) but it is not in flight", target);
        self.pending.len()
    }

    fn remaining(&self) -> usize {
        self.pending.len()
    }
}
