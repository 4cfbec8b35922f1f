// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene-bound node mirroring an object's transform and visibility.
//!
//! Connected inputs drive the object; the outputs always reflect the object's
//! current state, including writes made by the host outside the graph.

use crate::evaluation::ProcessContext;
use crate::node::{GraphNode, NodeData, NodeError};
use crate::port::{Port, PortType, PortValue};
use crate::registry::NodeSpawn;
use crate::scene::{ObjectId, SceneObject};

const POSITION: usize = 0;
const ROTATION: usize = 1;
const SCALE: usize = 2;
const VISIBLE: usize = 3;

/// Bidirectional mirror of one scene object
#[derive(Debug)]
pub struct ObjectTransformNode {
    data: NodeData,
    object: Option<ObjectId>,
}

impl ObjectTransformNode {
    /// Create a transform node bound to `spawn.object`
    pub fn new(spawn: NodeSpawn) -> Self {
        let data = NodeData::new(spawn.id, "object_transform", "Object Transform", spawn.position)
            .with_input(Port::input("position", PortType::Vector3))
            .with_input(Port::input("rotation", PortType::Vector3))
            .with_input(Port::input("scale", PortType::Vector3).with_default([1.0_f32; 3]))
            .with_input(Port::input("visible", PortType::Bool).with_default(true))
            .with_output(Port::output("position", PortType::Vector3))
            .with_output(Port::output("rotation", PortType::Vector3))
            .with_output(Port::output("scale", PortType::Vector3).with_default([1.0_f32; 3]))
            .with_output(Port::output("visible", PortType::Bool).with_default(true));
        Self {
            data,
            object: spawn.object,
        }
    }

    fn drive_object(&self, object: &mut SceneObject) {
        let connected = |i: usize| self.data.inputs[i].is_connected();
        let vector = |i: usize| self.data.input_value(i).and_then(PortValue::as_vector3);

        if connected(POSITION) {
            if let Some(v) = vector(POSITION) {
                object.set_position(v);
            }
        }
        if connected(ROTATION) {
            if let Some(v) = vector(ROTATION) {
                object.set_rotation(v);
            }
        }
        if connected(SCALE) {
            if let Some(v) = vector(SCALE) {
                object.set_scale(v);
            }
        }
        if connected(VISIBLE) {
            if let Some(v) = self.data.input_value(VISIBLE).and_then(PortValue::as_bool) {
                object.set_visible(v);
            }
        }
    }

    fn mirror_object(&mut self, object: &SceneObject) -> Result<bool, NodeError> {
        let mut changed = self.data.set_output(POSITION, object.position().into())?;
        changed |= self.data.set_output(ROTATION, object.rotation().into())?;
        changed |= self.data.set_output(SCALE, object.scale().into())?;
        changed |= self.data.set_output(VISIBLE, object.visible().into())?;
        Ok(changed)
    }
}

impl GraphNode for ObjectTransformNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    fn bound_object(&self) -> Option<ObjectId> {
        self.object
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), NodeError> {
        // Unbound or missing object: inert
        let Some(object) = ctx.object_mut() else {
            return Ok(());
        };
        self.drive_object(object);
        self.mirror_object(object)?;
        Ok(())
    }

    fn sync_from_object(&mut self, object: &SceneObject) -> bool {
        self.mirror_object(object).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionId;
    use crate::evaluation::FrameTime;
    use crate::node::NodeId;

    fn node_for(object: &SceneObject) -> ObjectTransformNode {
        ObjectTransformNode::new(NodeSpawn {
            id: NodeId(1),
            position: [0.0, 0.0],
            object: Some(object.id()),
        })
    }

    #[test]
    fn test_connected_input_drives_object() {
        let mut object = SceneObject::new("Cube");
        let mut node = node_for(&object);
        node.data.inputs[POSITION].connection = Some(ConnectionId::new(NodeId(0), 0, NodeId(1), 0));
        node.data.inputs[POSITION].value = PortValue::Vector3([0.0, 2.0, 0.0]);

        node.process(&mut ProcessContext::new(FrameTime::default(), Some(&mut object)))
            .unwrap();
        assert_eq!(object.position(), [0.0, 2.0, 0.0]);
        assert_eq!(
            node.data.output_value(POSITION),
            Some(&PortValue::Vector3([0.0, 2.0, 0.0]))
        );
        // Unconnected scale input leaves the object alone
        assert_eq!(object.scale(), [1.0; 3]);
    }

    #[test]
    fn test_sync_reports_changes_only_once() {
        let mut object = SceneObject::new("Cube");
        let mut node = node_for(&object);
        object.set_visible(false);
        assert!(node.sync_from_object(&object));
        assert!(!node.sync_from_object(&object));
        assert_eq!(node.data.output_value(VISIBLE), Some(&PortValue::Bool(false)));
    }

    #[test]
    fn test_unbound_node_is_inert() {
        let mut node = node_for(&SceneObject::new("Gone"));
        node.process(&mut ProcessContext::new(FrameTime::default(), None)).unwrap();
        assert!(node.data.take_changed_outputs().is_empty());
    }
}
