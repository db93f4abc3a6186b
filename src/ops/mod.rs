//! Repair operations built on the request coordinators

pub mod plan;
pub mod repair;

pub use plan::{plan_cluster, plan_waves, RepairPlan, Wave, WaveTarget};
pub use repair::{repair_cluster, FailedRepair, RepairReport, RepairSession};
