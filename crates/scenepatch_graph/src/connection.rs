// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a connection, derived from its four endpoint coordinates.
///
/// Two connections with the same endpoints always share an id, which is what
/// makes duplicate connect attempts detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId {
    /// Source node ID
    pub from_node: NodeId,
    /// Source output index
    pub from_output: usize,
    /// Target node ID
    pub to_node: NodeId,
    /// Target input index
    pub to_input: usize,
}

impl ConnectionId {
    /// Build the id for the given endpoints
    pub fn new(from_node: NodeId, from_output: usize, to_node: NodeId, to_input: usize) -> Self {
        Self {
            from_node,
            from_output,
            to_node,
            to_input,
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}",
            self.from_node, self.from_output, self.to_node, self.to_input
        )
    }
}

/// A directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Source node ID
    pub from_node: NodeId,
    /// Source output index
    pub from_output: usize,
    /// Target node ID
    pub to_node: NodeId,
    /// Target input index
    pub to_input: usize,
}

impl Connection {
    /// Create a new connection
    pub fn new(from_node: NodeId, from_output: usize, to_node: NodeId, to_input: usize) -> Self {
        Self {
            from_node,
            from_output,
            to_node,
            to_input,
        }
    }

    /// Deterministic id of this connection
    pub fn id(&self) -> ConnectionId {
        ConnectionId::new(self.from_node, self.from_output, self.to_node, self.to_input)
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

impl From<ConnectionId> for Connection {
    fn from(id: ConnectionId) -> Self {
        Self::new(id.from_node, id.from_output, id.to_node, id.to_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_derived_from_endpoints() {
        let a = Connection::new(NodeId(1), 0, NodeId(2), 1);
        let b = Connection::new(NodeId(1), 0, NodeId(2), 1);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), Connection::new(NodeId(1), 1, NodeId(2), 1).id());
        assert_eq!(a.id().to_string(), "node_1:0->node_2:1");
    }
}
