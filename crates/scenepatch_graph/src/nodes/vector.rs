// SPDX-License-Identifier: MIT OR Apache-2.0
//! Vector construction and decomposition nodes.

use crate::evaluation::ProcessContext;
use crate::node::{GraphNode, NodeData, NodeError};
use crate::port::{Port, PortType, PortValue};
use crate::registry::NodeSpawn;

/// Builds a vector from x/y/z floats
#[derive(Debug)]
pub struct ComposeVec3Node {
    data: NodeData,
}

impl ComposeVec3Node {
    /// Create a compose node
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "compose_vec3", "Compose Vector3", spawn.position)
            .with_input(Port::input("x", PortType::Float))
            .with_input(Port::input("y", PortType::Float))
            .with_input(Port::input("z", PortType::Float))
            .with_output(Port::output("vector", PortType::Vector3));
        Self { data }
    }
}

impl GraphNode for ComposeVec3Node {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let v = [
            self.data.input_float(0),
            self.data.input_float(1),
            self.data.input_float(2),
        ];
        self.data.set_output(0, PortValue::Vector3(v))?;
        Ok(())
    }
}

/// Breaks a vector into x/y/z floats
#[derive(Debug)]
pub struct SplitVec3Node {
    data: NodeData,
}

impl SplitVec3Node {
    /// Create a split node
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "split_vec3", "Split Vector3", spawn.position)
            .with_input(Port::input("vector", PortType::Vector3))
            .with_output(Port::output("x", PortType::Float))
            .with_output(Port::output("y", PortType::Float))
            .with_output(Port::output("z", PortType::Float));
        Self { data }
    }
}

impl GraphNode for SplitVec3Node {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let v = self
            .data
            .input_value(0)
            .and_then(PortValue::as_vector3)
            .unwrap_or_default();
        for (i, component) in v.into_iter().enumerate() {
            self.data.set_output(i, PortValue::Float(component))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FrameTime;
    use crate::node::NodeId;

    #[test]
    fn test_split_reports_each_component() {
        let mut node = SplitVec3Node::new(NodeSpawn {
            id: NodeId(9),
            position: [0.0, 0.0],
            object: None,
        });
        node.data.inputs[0].value = PortValue::Vector3([1.0, 2.0, 3.0]);
        node.process(&mut ProcessContext::new(FrameTime::default(), None)).unwrap();
        assert_eq!(node.data.output_value(2), Some(&PortValue::Float(3.0)));
        assert_eq!(node.data.take_changed_outputs(), vec![0, 1, 2]);
    }
}
