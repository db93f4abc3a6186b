//! Error types for dcrepair
//!
//! Only recoverable failures live here. Coordination protocol violations
//! (completing a target that is not in flight, starting twice) are bugs in
//! the caller and panic instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Coordination Errors ===
    #[error("Duplicate target: {0}")]
    DuplicateTarget(String),

    #[error("Coordinator already started")]
    AlreadyStarted,

    // === Repair Errors ===
    #[error("Repair failed on {target}: {reason}")]
    RepairFailed { target: String, reason: String },

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RepairFailed { .. } | Error::Io(_))
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
