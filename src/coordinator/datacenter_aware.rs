//! Datacenter-aware request sequencing
//!
//! Targets are queued per datacenter. At most one request per datacenter is
//! in flight at a time, while datacenters progress independently of each
//! other. This bounds cross-datacenter repair traffic without serialising
//! the whole cluster.

use crate::common::{Error, Result};
use crate::coordinator::{RequestCoordinator, RequestProcessor, Topology};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

/// Keeps one repair request in flight per datacenter.
///
/// The head of each datacenter queue is the in-flight target once the
/// coordinator has started. Datacenters are dispatched in ascending id
/// order at `start`.
pub struct DatacenterAwareCoordinator<T, P, S> {
    /// Datacenter id → pending targets, head in flight
    queues: BTreeMap<String, VecDeque<T>>,
    /// Every target ever added, to reject duplicates
    seen: HashSet<T>,
    remaining: usize,
    started: bool,
    processor: P,
    topology: S,
}

impl<T, P, S> DatacenterAwareCoordinator<T, P, S>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
    S: Topology<T>,
{
    pub fn new(processor: P, topology: S) -> Self {
        Self {
            queues: BTreeMap::new(),
            seen: HashSet::new(),
            remaining: 0,
            started: false,
            processor,
            topology,
        }
    }

    /// Targets of `datacenter` not yet completed, in-flight one included
    pub fn pending(&self, datacenter: &str) -> usize {
        self.queues.get(datacenter).map_or(0, VecDeque::len)
    }

    /// Datacenters that have received at least one target
    pub fn datacenters(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    /// Target currently in flight for `datacenter`
    pub fn in_flight(&self, datacenter: &str) -> Option<&T> {
        if !self.started {
            return None;
        }
        self.queues.get(datacenter).and_then(VecDeque::front)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.remaining == 0
    }
}

impl<T, P, S> RequestCoordinator<T> for DatacenterAwareCoordinator<T, P, S>
where
    T: Clone + Eq + Hash + Debug,
    P: RequestProcessor<T>,
    S: Topology<T>,
{
    fn add(&mut self, target: T) -> Result<()> {
        // Late datacenters would never get their head dispatched.
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        if self.seen.contains(&target) {
            return Err(Error::DuplicateTarget(format!("{:?}", target)));
        }

        let dc = self.topology.datacenter(&target);
        tracing::debug!(node = ?target, datacenter = %dc, "queued repair target");

        self.seen.insert(target.clone());
        self.queues.entry(dc).or_default().push_back(target);
        self.remaining += 1;
        Ok(())
    }

    fn start(&mut self) {
        assert!(!self.started, "coordinator started twice");
        self.started = true;

        for (dc, queue) in &self.queues {
            if let Some(head) = queue.front() {
                tracing::debug!(node = ?head, datacenter = %dc, "dispatching");
                self.processor.process(head);
            }
        }
    }

    fn completed(&mut self, target: &T) -> usize {
        assert!(self.started, "completed({:?}) called before start", target);

        let dc = self.topology.datacenter(target);
        let queue = match self.queues.get_mut(&dc) {
            Some(queue) => queue,
            None => panic!("completed({:?}) for datacenter {} which has no queue", target, dc),
        };

        match queue.front() {
            Some(head) if head == target => {}
            Some(head) => panic!(
                "completed({:?}) but {:?} is in flight for datacenter {}",
                target, head, dc
            ),
            None => panic!("completed({:?}) but datacenter {} has nothing in flight", target, dc),
        }

        queue.pop_front();
        if let Some(next) = queue.front() {
            tracing::debug!(node = ?next, datacenter = %dc, "dispatching");
            self.processor.process(next);
        }

        self.remaining -= 1;
        self.remaining
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}
