//! Sequencing properties of the datacenter-aware coordinator, checked over
//! randomised completion orders

use dcrepair::{DatacenterAwareCoordinator, RequestCoordinator, StaticTopology};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::IpAddr;
use std::rc::Rc;

const DATACENTERS: [&str; 4] = ["us-east", "us-west", "eu-central", "ap-south"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Node {
    id: u32,
    dc: &'static str,
}

fn node_dc(node: &Node) -> String {
    node.dc.to_string()
}

fn random_nodes(rng: &mut StdRng, n: u32, datacenters: &[&'static str]) -> Vec<Node> {
    (0..n)
        .map(|id| Node {
            id,
            dc: datacenters[rng.gen_range(0..datacenters.len())],
        })
        .collect()
}

struct Run {
    dispatch_log: Vec<Node>,
    returns: Vec<usize>,
    max_in_flight_per_dc: usize,
}

/// Start the coordinator, then repeatedly complete a random in-flight node
fn drive(nodes: &[Node], seed: u64) -> Run {
    let dispatched = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&dispatched);
    let mut coord = DatacenterAwareCoordinator::new(
        move |n: &Node| sink.borrow_mut().push(n.clone()),
        node_dc,
    );
    for n in nodes {
        coord.add(n.clone()).unwrap();
    }
    coord.start();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut in_flight: Vec<Node> = Vec::new();
    let mut consumed = 0;
    let mut max_in_flight_per_dc = 0;
    let mut returns = Vec::new();

    loop {
        {
            let log = dispatched.borrow();
            in_flight.extend(log[consumed..].iter().cloned());
            consumed = log.len();
        }

        let mut per_dc: HashMap<&str, usize> = HashMap::new();
        for n in &in_flight {
            *per_dc.entry(n.dc).or_default() += 1;
        }
        let busiest = per_dc.values().copied().max().unwrap_or(0);
        max_in_flight_per_dc = max_in_flight_per_dc.max(busiest);

        if in_flight.is_empty() {
            break;
        }
        let node = in_flight.swap_remove(rng.gen_range(0..in_flight.len()));
        returns.push(coord.completed(&node));
    }

    assert_eq!(coord.remaining(), 0);
    let dispatch_log = dispatched.borrow().clone();
    Run {
        dispatch_log,
        returns,
        max_in_flight_per_dc,
    }
}

#[test]
fn fifo_within_each_datacenter() {
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = random_nodes(&mut rng, 40, &DATACENTERS);
        let run = drive(&nodes, seed);

        for dc in DATACENTERS {
            let submitted: Vec<u32> =
                nodes.iter().filter(|n| n.dc == dc).map(|n| n.id).collect();
            let dispatched: Vec<u32> = run
                .dispatch_log
                .iter()
                .filter(|n| n.dc == dc)
                .map(|n| n.id)
                .collect();
            assert_eq!(submitted, dispatched, "seed {} datacenter {}", seed, dc);
        }
    }
}

#[test]
fn single_request_in_flight_per_datacenter() {
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = random_nodes(&mut rng, 40, &DATACENTERS);
        let run = drive(&nodes, seed);
        assert_eq!(run.max_in_flight_per_dc, 1, "seed {}", seed);
    }
}

#[test]
fn completed_returns_remaining_count() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = rng.gen_range(1..60);
        let nodes = random_nodes(&mut rng, k, &DATACENTERS);
        let run = drive(&nodes, seed);

        let expected: Vec<usize> = (0..k as usize).rev().collect();
        assert_eq!(run.returns, expected, "seed {}", seed);
    }
}

#[test]
fn every_target_dispatched_exactly_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let nodes = random_nodes(&mut rng, 100, &DATACENTERS);
    let run = drive(&nodes, 7);

    let mut ids: Vec<u32> = run.dispatch_log.iter().map(|n| n.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..100u32).collect::<Vec<_>>());
}

#[test]
fn draining_one_datacenter_leaves_others_untouched() {
    let nodes: Vec<Node> = (0..6)
        .map(|id| Node {
            id,
            dc: if id % 2 == 0 { "dc-a" } else { "dc-b" },
        })
        .collect();

    let dispatched = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&dispatched);
    let mut coord =
        DatacenterAwareCoordinator::new(move |n: &Node| sink.borrow_mut().push(n.id), node_dc);
    for n in &nodes {
        coord.add(n.clone()).unwrap();
    }
    coord.start();

    for n in nodes.iter().filter(|n| n.dc == "dc-a") {
        coord.completed(n);
    }

    assert_eq!(coord.pending("dc-a"), 0);
    assert_eq!(coord.pending("dc-b"), 3);
    assert_eq!(coord.in_flight("dc-b").map(|n| n.id), Some(1));
    // dc-b only ever saw its head
    let b_dispatched: Vec<u32> = dispatched
        .borrow()
        .iter()
        .copied()
        .filter(|id| id % 2 == 1)
        .collect();
    assert_eq!(b_dispatched, vec![1]);
}

/// `us-west` is known to the topology but never receives a target
fn topology_with_idle_datacenter() -> StaticTopology {
    StaticTopology::new("eu-central")
        .with_node("eu-1", "eu-central")
        .with_node("eu-2", "eu-central")
        .with_node("west-1", "us-west")
}

#[test]
fn empty_datacenters_are_never_dispatched() {
    let topology = topology_with_idle_datacenter();
    let dispatched = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&dispatched);
    let mut coord = DatacenterAwareCoordinator::new(
        move |t: &String| sink.borrow_mut().push(t.clone()),
        topology,
    );
    coord.add("eu-1".to_string()).unwrap();
    coord.add("eu-2".to_string()).unwrap();
    coord.start();

    assert_eq!(*dispatched.borrow(), vec!["eu-1"]);
    assert_eq!(coord.datacenters().collect::<Vec<_>>(), vec!["eu-central"]);
    assert_eq!(coord.pending("us-west"), 0);
    assert_eq!(coord.in_flight("us-west"), None);

    assert_eq!(coord.completed(&"eu-1".to_string()), 1);
    assert_eq!(coord.completed(&"eu-2".to_string()), 0);
    assert_eq!(*dispatched.borrow(), vec!["eu-1", "eu-2"]);
}

#[test]
#[should_panic(expected = "has no queue")]
fn completing_a_target_of_an_idle_datacenter_is_fatal() {
    let mut coord =
        DatacenterAwareCoordinator::new(|_: &String| {}, topology_with_idle_datacenter());
    coord.add("eu-1".to_string()).unwrap();
    coord.start();
    coord.completed(&"west-1".to_string());
}

#[test]
fn scenario_with_addresses() {
    let ip = |s: &str| s.parse::<IpAddr>().unwrap();
    let (n1, n2, n3) = (ip("10.0.0.1"), ip("10.0.0.2"), ip("10.1.0.1"));
    let topology = StaticTopology::new("dc1")
        .with_node("10.0.0.1", "dc1")
        .with_node("10.0.0.2", "dc1")
        .with_node("10.1.0.1", "dc2");

    let dispatched = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&dispatched);
    let mut coord =
        DatacenterAwareCoordinator::new(move |a: &IpAddr| sink.borrow_mut().push(*a), topology);
    coord.add(n1).unwrap();
    coord.add(n2).unwrap();
    coord.add(n3).unwrap();

    coord.start();
    let mut first = dispatched.borrow().clone();
    first.sort();
    assert_eq!(first, vec![n1, n3]);

    assert_eq!(coord.completed(&n1), 2);
    assert_eq!(dispatched.borrow().last(), Some(&n2));
    assert_eq!(coord.completed(&n3), 1);
    assert_eq!(coord.completed(&n2), 0);
    assert_eq!(dispatched.borrow().len(), 3);
}

#[test]
#[should_panic(expected = "is in flight")]
fn completing_a_queued_target_is_fatal() {
    let topology = StaticTopology::new("dc1").with_node("n3", "dc2");
    let mut coord = DatacenterAwareCoordinator::new(|_: &String| {}, topology);
    for t in ["n1", "n2", "n3"] {
        coord.add(t.to_string()).unwrap();
    }
    coord.start();
    coord.completed(&"n2".to_string());
}
