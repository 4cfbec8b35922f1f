// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node catalog.
//!
//! A small set of value, math, vector and scene nodes. Hosts can register
//! further types on the returned registry before handing it to the engine.

pub mod math;
pub mod transform;
pub mod vector;

use crate::node::NodeCategory;
use crate::registry::{NodeRegistry, NodeTypeInfo};

pub use math::{BinaryOp, BinaryOpNode, NumberNode, SineNode, TimeNode};
pub use transform::ObjectTransformNode;
pub use vector::{ComposeVec3Node, SplitVec3Node};

/// Create the registry holding every built-in node type
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // Inputs
    registry.register(
        NodeTypeInfo::new("time", "Time", NodeCategory::Input)
            .with_description("Seconds since playback started, scaled by 'speed'"),
        |spawn| Ok(Box::new(TimeNode::new(spawn))),
    );
    registry.register(
        NodeTypeInfo::new("number", "Number", NodeCategory::Input)
            .with_description("Constant taken from the 'value' property"),
        |spawn| Ok(Box::new(NumberNode::new(spawn))),
    );

    // Math
    registry.register(
        NodeTypeInfo::new("add", "Add", NodeCategory::Math).with_description("A + B"),
        |spawn| Ok(Box::new(BinaryOpNode::new(spawn, BinaryOp::Add))),
    );
    registry.register(
        NodeTypeInfo::new("multiply", "Multiply", NodeCategory::Math).with_description("A * B"),
        |spawn| Ok(Box::new(BinaryOpNode::new(spawn, BinaryOp::Multiply))),
    );
    registry.register(
        NodeTypeInfo::new("sine", "Sine", NodeCategory::Math)
            .with_description("Amplitude * sin(X)"),
        |spawn| Ok(Box::new(SineNode::new(spawn))),
    );

    // Vectors
    registry.register(
        NodeTypeInfo::new("compose_vec3", "Compose Vector3", NodeCategory::Vector)
            .with_description("Build a vector from three floats"),
        |spawn| Ok(Box::new(ComposeVec3Node::new(spawn))),
    );
    registry.register(
        NodeTypeInfo::new("split_vec3", "Split Vector3", NodeCategory::Vector)
            .with_description("Break a vector into its components"),
        |spawn| Ok(Box::new(SplitVec3Node::new(spawn))),
    );

    // Scene
    registry.register(
        NodeTypeInfo::new("object_transform", "Object Transform", NodeCategory::Scene)
            .with_description("Reads and drives a scene object's transform and visibility")
            .mirroring_property(),
        |spawn| Ok(Box::new(ObjectTransformNode::new(spawn))),
    );

    registry
}
