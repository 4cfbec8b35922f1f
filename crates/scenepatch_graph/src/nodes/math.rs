// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalar value and math nodes.

use crate::evaluation::ProcessContext;
use crate::node::{GraphNode, NodeData, NodeError};
use crate::port::{Port, PortType, PortValue};
use crate::registry::NodeSpawn;
use serde_json::Value;

/// Emits elapsed frame time
#[derive(Debug)]
pub struct TimeNode {
    data: NodeData,
}

impl TimeNode {
    /// Create a time node
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "time", "Time", spawn.position)
            .with_output(Port::output("time", PortType::Float))
            .with_property("speed", 1.0_f64);
        Self { data }
    }
}

impl GraphNode for TimeNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn is_animated(&self) -> bool {
        true
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let speed = self.data.property_f32("speed").unwrap_or(1.0);
        let time = (ctx.time.elapsed as f32) * speed;
        self.data.set_output(0, PortValue::Float(time))?;
        Ok(())
    }
}

/// Constant float from the `value` property
#[derive(Debug)]
pub struct NumberNode {
    data: NodeData,
}

impl NumberNode {
    /// Create a number node
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "number", "Number", spawn.position)
            .with_output(Port::output("value", PortType::Float))
            .with_property("value", 0.0_f64);
        Self { data }
    }
}

impl GraphNode for NumberNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let value = match self.data.properties.get("value") {
            None | Some(Value::Null) => 0.0,
            Some(v) => v.as_f64().ok_or_else(|| NodeError::InvalidProperty {
                name: "value".to_string(),
                reason: format!("expected a number, found {v}"),
            })? as f32,
        };
        self.data.set_output(0, PortValue::Float(value))?;
        Ok(())
    }
}

/// Two-operand arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// A + B
    Add,
    /// A * B
    Multiply,
}

impl BinaryOp {
    fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Add => a + b,
            Self::Multiply => a * b,
        }
    }
}

/// Arithmetic over two float inputs
#[derive(Debug)]
pub struct BinaryOpNode {
    data: NodeData,
    op: BinaryOp,
}

impl BinaryOpNode {
    /// Create an arithmetic node
    pub fn new(spawn: NodeSpawn, op: BinaryOp) -> Self {
        let (tag, name, identity) = match op {
            BinaryOp::Add => ("add", "Add", 0.0_f32),
            BinaryOp::Multiply => ("multiply", "Multiply", 1.0_f32),
        };
        let data = NodeData::new(spawn.id, tag, name, spawn.position)
            .with_input(Port::input("a", PortType::Float).with_default(identity))
            .with_input(Port::input("b", PortType::Float).with_default(identity))
            .with_output(Port::output("result", PortType::Float));
        Self { data, op }
    }
}

impl GraphNode for BinaryOpNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let result = self.op.apply(self.data.input_float(0), self.data.input_float(1));
        self.data.set_output(0, PortValue::Float(result))?;
        Ok(())
    }
}

/// `amplitude * sin(x)`
#[derive(Debug)]
pub struct SineNode {
    data: NodeData,
}

impl SineNode {
    /// Create a sine node
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "sine", "Sine", spawn.position)
            .with_input(Port::input("x", PortType::Float))
            .with_input(Port::input("amplitude", PortType::Float).with_default(1.0_f32))
            .with_output(Port::output("y", PortType::Float));
        Self { data }
    }
}

impl GraphNode for SineNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        let y = self.data.input_float(1) * self.data.input_float(0).sin();
        self.data.set_output(0, PortValue::Float(y))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FrameTime;
    use crate::node::NodeId;

    fn spawn() -> NodeSpawn {
        NodeSpawn {
            id: NodeId(1),
            position: [0.0, 0.0],
            object: None,
        }
    }

    #[test]
    fn test_multiply_defaults_to_identity() {
        let mut node = BinaryOpNode::new(spawn(), BinaryOp::Multiply);
        node.data.inputs[0].value = PortValue::Float(4.0);
        node.process(&mut ProcessContext::new(FrameTime::default(), None)).unwrap();
        assert_eq!(node.data.output_value(0), Some(&PortValue::Float(4.0)));
    }

    #[test]
    fn test_time_scales_with_speed() {
        let mut node = TimeNode::new(spawn());
        node.data.properties.insert("speed".into(), 2.0_f64.into());
        let time = FrameTime {
            elapsed: 1.5,
            delta: 0.016,
            frame: 90,
        };
        node.process(&mut ProcessContext::new(time, None)).unwrap();
        assert_eq!(node.data.output_value(0), Some(&PortValue::Float(3.0)));
    }

    #[test]
    fn test_number_rejects_non_numeric_property() {
        let mut node = NumberNode::new(spawn());
        node.data.properties.insert("value".into(), "five".into());
        let err = node
            .process(&mut ProcessContext::new(FrameTime::default(), None))
            .unwrap_err();
        assert!(matches!(err, NodeError::InvalidProperty { .. }));
    }
}
