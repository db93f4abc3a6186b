//! Common types shared across dcrepair

pub mod config;
pub mod error;

pub use config::{NodeConfig, RepairConfig, SimulationConfig};
pub use error::{Error, Result};
