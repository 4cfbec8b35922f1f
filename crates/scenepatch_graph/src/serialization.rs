// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph documents: the serialized form of a patch graph.
//!
//! JSON is the interchange format handed to the host; RON is the on-disk
//! project format. Restoring is tolerant: nodes whose type is unknown are
//! skipped, as are connections touching them.

use crate::connection::{Connection, ConnectionId};
use crate::graph::PatchGraph;
use crate::node::{GraphNode, NodeId, SerializedNode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current document format version
pub const DOCUMENT_VERSION: &str = "1.0";

/// Informational header of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Format version
    pub version: String,
    /// Seconds since the Unix epoch at save time
    pub timestamp: u64,
    /// Graph name
    #[serde(default)]
    pub name: String,
}

impl DocumentMetadata {
    fn now(name: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            version: DOCUMENT_VERSION.to_string(),
            timestamp,
            name: name.to_string(),
        }
    }
}

/// Serialized graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes keyed by id (`node_N`)
    pub nodes: IndexMap<String, SerializedNode>,
    /// Connections
    pub connections: Vec<Connection>,
    /// Header
    pub metadata: DocumentMetadata,
}

impl GraphDocument {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a RON document
    pub fn from_ron(source: &str) -> Result<Self, SerializationError> {
        Ok(ron::from_str(source)?)
    }

    /// Encode as pretty RON
    pub fn to_ron(&self) -> Result<String, SerializationError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }
}

/// What a restore had to leave out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Nodes that could not be constructed, with their declared type
    pub skipped_nodes: Vec<(String, String)>,
    /// Connections whose endpoints did not materialize
    pub skipped_connections: Vec<ConnectionId>,
}

impl RestoreReport {
    /// Whether everything was restored
    pub fn is_complete(&self) -> bool {
        self.skipped_nodes.is_empty() && self.skipped_connections.is_empty()
    }
}

/// Document encode/decode failure
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON encode error
    #[error("RON encode error: {0}")]
    RonEncode(#[from] ron::Error),
}

impl PatchGraph {
    /// Capture nodes and connections
    pub fn serialize(&self) -> GraphDocument {
        let nodes = self
            .nodes()
            .map(|node| {
                let serialized = GraphNode::serialize(node);
                (serialized.id.to_string(), serialized)
            })
            .collect();
        GraphDocument {
            nodes,
            connections: self.connections().cloned().collect(),
            metadata: DocumentMetadata::now(&self.name),
        }
    }

    /// Replace the graph with a document's contents.
    ///
    /// Nodes are built first, then connections; the node id counter ends one
    /// past the largest restored id. Failures are logged and reported.
    pub fn deserialize(&mut self, document: &GraphDocument) -> RestoreReport {
        self.clear();
        if !document.metadata.name.is_empty() {
            self.name.clone_from(&document.metadata.name);
        }

        let mut report = RestoreReport::default();

        for (key, serialized) in &document.nodes {
            let mut serialized = serialized.clone();
            // The map key is authoritative when it parses
            if let Ok(id) = key.parse::<NodeId>() {
                serialized.id = id;
            }
            if let Err(err) = self.restore_node(&serialized) {
                tracing::warn!(node = %key, node_type = %serialized.node_type, error = %err, "skipping node");
                report
                    .skipped_nodes
                    .push((key.clone(), serialized.node_type.clone()));
            }
        }

        for connection in &document.connections {
            let id = connection.id();
            if !self.contains_node(connection.from_node) || !self.contains_node(connection.to_node) {
                tracing::warn!(connection = %id, "skipping connection to missing node");
                report.skipped_connections.push(id);
                continue;
            }
            if let Err(err) = self.add_connection(
                connection.from_node,
                connection.from_output,
                connection.to_node,
                connection.to_input,
            ) {
                tracing::warn!(connection = %id, error = %err, "skipping connection");
                report.skipped_connections.push(id);
            }
        }

        self.recompute_next_id();
        tracing::info!(
            nodes = self.node_count(),
            connections = self.connection_count(),
            skipped_nodes = report.skipped_nodes.len(),
            skipped_connections = report.skipped_connections.len(),
            "graph restored"
        );
        self.emit_loaded();
        report
    }
}
