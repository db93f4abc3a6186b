//! Datacenter resolution for repair targets

use std::collections::HashMap;
use std::fmt::Display;

/// Maps a target to the datacenter it lives in.
///
/// Implementations must be deterministic and total: every target ever
/// passed to a coordinator resolves, and always to the same datacenter.
pub trait Topology<T> {
    fn datacenter(&self, target: &T) -> String;
}

impl<T, F> Topology<T> for F
where
    F: Fn(&T) -> String,
{
    fn datacenter(&self, target: &T) -> String {
        self(target)
    }
}

/// Fixed node → datacenter table.
///
/// Nodes are keyed by their display form, so `String`, `IpAddr` and
/// `SocketAddr` targets all resolve against the same table. Unlisted
/// nodes fall back to the default datacenter.
#[derive(Debug, Clone)]
pub struct StaticTopology {
    nodes: HashMap<String, String>,
    default_datacenter: String,
}

impl StaticTopology {
    pub fn new(default_datacenter: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            default_datacenter: default_datacenter.into(),
        }
    }

    /// Pin a node to a datacenter
    pub fn with_node(mut self, node: impl Into<String>, datacenter: impl Into<String>) -> Self {
        self.nodes.insert(node.into(), datacenter.into());
        self
    }

    pub fn default_datacenter(&self) -> &str {
        &self.default_datacenter
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Display> Topology<T> for StaticTopology {
    fn datacenter(&self, target: &T) -> String {
        self.nodes
            .get(&target.to_string())
            .unwrap_or(&self.default_datacenter)
            .clone()
    }
}
