// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::evaluation::ProcessContext;
use crate::port::{Port, PortValue};
use crate::scene::{ObjectId, SceneObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a node, unique within one graph engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("node_").unwrap_or(s).parse().map(Self)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (constants, time)
    Input,
    /// Math operations
    Math,
    /// Vector construction/decomposition
    Vector,
    /// Nodes that mirror a scene object
    Scene,
    /// Utility nodes
    Utility,
}

/// Error raised by a single node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
    /// Processing failed
    #[error("Processing failed: {0}")]
    Processing(String),

    /// A property in the bag has the wrong shape
    #[error("Invalid property '{name}': {reason}")]
    InvalidProperty {
        /// Property key
        name: String,
        /// What was wrong
        reason: String,
    },

    /// Port index does not exist
    #[error("No port at index {0}")]
    PortIndex(usize),

    /// `process()` panicked; the payload message is kept
    #[error("Panicked: {0}")]
    Panicked(String),
}

/// State shared by every node: identity, layout, ports and property bag
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Unique instance ID
    pub id: NodeId,
    /// Registry type tag
    pub node_type: String,
    /// Display name
    pub name: String,
    /// Position in the graph canvas (world space)
    pub position: [f32; 2],
    /// Input ports, in declaration order
    pub inputs: Vec<Port>,
    /// Output ports, in declaration order
    pub outputs: Vec<Port>,
    /// Type-specific state
    pub properties: Map<String, Value>,
    changed_outputs: Vec<usize>,
}

impl NodeData {
    /// Create node data with no ports
    pub fn new(id: NodeId, node_type: impl Into<String>, name: impl Into<String>, position: [f32; 2]) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            name: name.into(),
            position,
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: Map::new(),
            changed_outputs: Vec::new(),
        }
    }

    /// Declare an input port
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    /// Declare an output port
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Seed a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.inputs.get(index)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.outputs.get(index)
    }

    /// Current value of an input
    pub fn input_value(&self, index: usize) -> Option<&PortValue> {
        self.inputs.get(index).map(|p| &p.value)
    }

    /// Current value of an input as a float
    pub fn input_float(&self, index: usize) -> f32 {
        self.input_value(index).and_then(PortValue::as_float).unwrap_or(0.0)
    }

    /// Current value of an output
    pub fn output_value(&self, index: usize) -> Option<&PortValue> {
        self.outputs.get(index).map(|p| &p.value)
    }

    /// Write an output value.
    ///
    /// A changed value marks the output for propagation along its connections.
    pub fn set_output(&mut self, index: usize, value: PortValue) -> Result<bool, NodeError> {
        let port = self.outputs.get_mut(index).ok_or(NodeError::PortIndex(index))?;
        let value = value.coerce_to(&port.port_type).unwrap_or(value);
        let changed = port.set_value(value);
        if changed && !self.changed_outputs.contains(&index) {
            self.changed_outputs.push(index);
        }
        Ok(changed)
    }

    /// Drain the outputs written since the last call
    pub fn take_changed_outputs(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.changed_outputs)
    }

    /// Read a float property
    pub fn property_f32(&self, key: &str) -> Option<f32> {
        self.properties.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }
}

/// Contract implemented by every node variant.
///
/// Concrete variants are created through the [`crate::registry::NodeRegistry`];
/// the engine only ever sees `Box<dyn GraphNode>`.
pub trait GraphNode: Send + Sync {
    /// Shared node state
    fn data(&self) -> &NodeData;

    /// Mutable shared node state
    fn data_mut(&mut self) -> &mut NodeData;

    /// Read inputs, compute, write outputs via [`NodeData::set_output`]
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), NodeError>;

    /// Scene object this node mirrors, if any
    fn bound_object(&self) -> Option<ObjectId> {
        None
    }

    /// Whether the node must be re-evaluated every frame
    fn is_animated(&self) -> bool {
        false
    }

    /// Pull tracked fields from the bound object into the ports.
    ///
    /// Returns whether any port value changed.
    fn sync_from_object(&mut self, _object: &SceneObject) -> bool {
        false
    }

    /// Capture id, type, position, property bag and binding reference
    fn serialize(&self) -> SerializedNode {
        let data = self.data();
        SerializedNode {
            id: data.id,
            node_type: data.node_type.clone(),
            name: data.name.clone(),
            position: data.position,
            properties: data.properties.clone(),
            object: self.bound_object(),
        }
    }

    /// Restore state captured by [`GraphNode::serialize`]
    fn deserialize(&mut self, serialized: &SerializedNode) -> Result<(), NodeError> {
        let data = self.data_mut();
        data.id = serialized.id;
        data.name.clone_from(&serialized.name);
        data.position = serialized.position;
        data.properties.clone_from(&serialized.properties);
        Ok(())
    }
}

impl fmt::Debug for dyn GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        f.debug_struct("GraphNode")
            .field("id", &data.id)
            .field("type", &data.node_type)
            .field("position", &data.position)
            .finish()
    }
}

/// Serialized form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    /// Node id
    pub id: NodeId,
    /// Registry type tag
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Canvas position
    pub position: [f32; 2],
    /// Property bag
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Referenced scene object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    #[test]
    fn test_node_id_parse() {
        assert_eq!("node_12".parse::<NodeId>().unwrap(), NodeId(12));
        assert_eq!("7".parse::<NodeId>().unwrap(), NodeId(7));
        assert!("node_x".parse::<NodeId>().is_err());
        assert_eq!(NodeId(3).to_string(), "node_3");
    }

    #[test]
    fn test_set_output_tracks_changes() {
        let mut data = NodeData::new(NodeId(1), "number", "Number", [0.0, 0.0])
            .with_output(Port::output("value", PortType::Float));

        assert!(data.set_output(0, PortValue::Float(2.0)).unwrap());
        assert!(!data.set_output(0, PortValue::Float(2.0)).unwrap());
        assert_eq!(data.take_changed_outputs(), vec![0]);
        assert!(data.take_changed_outputs().is_empty());
        assert_eq!(data.set_output(3, PortValue::Float(1.0)), Err(NodeError::PortIndex(3)));
    }

    #[test]
    fn test_set_output_coerces_to_port_type() {
        let mut data = NodeData::new(NodeId(1), "count", "Count", [0.0, 0.0])
            .with_output(Port::output("n", PortType::Int));
        data.set_output(0, PortValue::Float(2.6)).unwrap();
        assert_eq!(data.output_value(0), Some(&PortValue::Int(3)));
    }
}
