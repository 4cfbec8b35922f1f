// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluation scheduling: the pending-node queue and the per-node context.

use crate::node::NodeId;
use crate::scene::SceneObject;
use indexmap::IndexSet;

/// Deduplicated set of nodes awaiting `process()`.
///
/// Insertion order is preserved so a tick processes nodes in the order they
/// were first queued.
#[derive(Debug, Clone, Default)]
pub struct EvaluationQueue {
    pending: IndexSet<NodeId>,
}

impl EvaluationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a node; returns false if it was already pending
    pub fn push(&mut self, node_id: NodeId) -> bool {
        self.pending.insert(node_id)
    }

    /// Drop a node from the queue (e.g. when it is removed from the graph)
    pub fn remove(&mut self, node_id: NodeId) -> bool {
        self.pending.shift_remove(&node_id)
    }

    /// Check whether a node is pending
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.pending.contains(&node_id)
    }

    /// Snapshot the pending set and clear it
    pub fn take(&mut self) -> Vec<NodeId> {
        self.pending.drain(..).collect()
    }

    /// Number of pending nodes
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every pending node
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Frame clock driving time-based nodes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the engine started ticking
    pub elapsed: f64,
    /// Seconds since the previous tick
    pub delta: f64,
    /// Number of ticks run so far
    pub frame: u64,
}

/// Context handed to [`crate::node::GraphNode::process`]
pub struct ProcessContext<'a> {
    /// Current frame time
    pub time: FrameTime,
    object: Option<&'a mut SceneObject>,
}

impl<'a> ProcessContext<'a> {
    /// Create a context, optionally exposing the node's bound object
    pub fn new(time: FrameTime, object: Option<&'a mut SceneObject>) -> Self {
        Self { time, object }
    }

    /// Bound scene object, if the node is bound and the object is live
    pub fn object(&self) -> Option<&SceneObject> {
        self.object.as_deref()
    }

    /// Mutable bound scene object
    pub fn object_mut(&mut self) -> Option<&mut SceneObject> {
        self.object.as_deref_mut()
    }
}
