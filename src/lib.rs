//! # dcrepair
//!
//! Sequencing of repair requests across a multi-datacenter cluster:
//! - Datacenter-aware coordination: one request in flight per datacenter,
//!   datacenters progressing in parallel
//! - Sequential and fully parallel coordinators behind the same trait
//! - Async repair sessions that run dispatched targets on tokio
//! - Dry-run planning of dispatch waves
//!
//! ## Architecture
//!
//! ```text
//!   add(target)*  ──►  ┌──────────────────────────────┐
//!                      │ DatacenterAwareCoordinator   │
//!   start()       ──►  │  dc1: [n1, n2, n4]  ◄ head   │ ──► processor(n1)
//!                      │  dc2: [n3]          ◄ head   │ ──► processor(n3)
//!   completed(n1) ──►  └──────────────────────────────┘ ──► processor(n2)
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Show which nodes would be repaired together
//! dcrepair plan --config cluster.toml
//!
//! # Run a simulated repair with random latency and failures
//! dcrepair simulate --config cluster.toml --fail-rate 0.1
//! ```

pub mod common;
pub mod coordinator;
pub mod ops;

// Re-export commonly used types
pub use common::{Error, RepairConfig, Result};
pub use coordinator::{
    DatacenterAwareCoordinator, RepairParallelism, RequestCoordinator, RequestProcessor,
    StaticTopology, Topology,
};
pub use ops::{RepairReport, RepairSession};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
