//! One repair request in flight across the whole cluster

use crate::common::{Error, Result};
use crate::coordinator::{RequestCoordinator, RequestProcessor};
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

/// Dispatches targets strictly one after another, in submission order.
pub struct SequentialCoordinator<T, P> {
    queue: VecDeque<T>,
    seen: HashSet<T>,
    started: bool,
    processor: P,
}

impl<T, P> SequentialCoordinator<T, P>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
{
    pub fn new(processor: P) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            started: false,
            processor,
        }
    }

    pub fn in_flight(&self) -> Option<&T> {
        if self.started {
            self.queue.front()
        } else {
            None
        }
    }
}

impl<T, P> RequestCoordinator<T> for SequentialCoordinator<T, P>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
{
    fn add(&mut self, target: T) -> Result<()> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        if !self.seen.insert(target.clone()) {
            return Err(Error::DuplicateTarget(format!("{:?}", target)));
        }
        self.queue.push_back(target);
        Ok(())
    }

    fn start(&mut self) {
        assert!(!self.started, "coordinator started twice");
        self.started = true;

        if let Some(head) = self.queue.front() {
            tracing::debug!(node = ?head, "dispatching");
            self.processor.process(head);
        }
    }

    fn completed(&mut self, target: &T) -> usize {
        assert!(self.started, "completed({:?}) called before start", target);

        match self.queue.front() {
            Some(head) if head == target => {}
            Some(head) => panic!("completed({:?}) but {:?} is in flight", target, head),
            None => panic!("completed({:?}) but nothing is in flight", target),
        }

        self.queue.pop_front();
        if let Some(next) = self.queue.front() {
            tracing::debug!(node = ?next, "dispatching");
            self.processor.process(next);
        }
        self.queue.len()
    }

    fn remaining(&self) -> usize {
        self.queue.len()
    }
}
