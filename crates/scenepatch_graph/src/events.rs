// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed event channels.
//!
//! Each event kind is a tagged union delivered to an explicit listener list.

use crate::connection::ConnectionId;
use crate::node::NodeId;
use crate::scene::ObjectId;
use serde::{Deserialize, Serialize};

/// Events emitted by the graph engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A node was registered in the engine
    NodeAdded {
        /// Node id
        node: NodeId,
    },
    /// A node was removed (after its connections)
    NodeRemoved {
        /// Node id
        node: NodeId,
    },
    /// A node was moved on the canvas
    NodeMoved {
        /// Node id
        node: NodeId,
        /// New position
        position: [f32; 2],
    },
    /// A connection was created
    ConnectionAdded {
        /// Connection id
        connection: ConnectionId,
    },
    /// A connection was removed
    ConnectionRemoved {
        /// Connection id
        connection: ConnectionId,
    },
    /// A scene object was selected, from the host or from a bound node
    ObjectSelected {
        /// Selected object
        object: ObjectId,
    },
    /// A scene-bound node finished processing; the host should refresh the object
    SceneObjectUpdated {
        /// Updated object
        object: ObjectId,
    },
    /// The whole graph was replaced by a restore
    GraphLoaded,
}

/// Events consumed from the host editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The user selected an object in the scene
    ObjectSelected(ObjectId),
    /// An object changed in a way the tracked fields may not cover
    ObjectChanged(ObjectId),
    /// An object was added to the scene
    ObjectAdded(ObjectId),
    /// An object was removed from the scene
    ObjectRemoved(ObjectId),
}

/// Handle of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E) + Send>;

/// Listener list for one event kind
pub struct EventChannel<E> {
    listeners: Vec<(ListenerId, Listener<E>)>,
    next_id: u64,
}

impl<E> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> EventChannel<E> {
    /// Create a channel with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener in registration order
    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_listeners_until_unsubscribed() {
        let mut channel = EventChannel::<GraphEvent>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = channel.subscribe(move |e| sink.lock().push(e.clone()));

        channel.emit(&GraphEvent::NodeAdded { node: NodeId(1) });
        assert!(channel.unsubscribe(id));
        channel.emit(&GraphEvent::NodeRemoved { node: NodeId(1) });

        assert_eq!(*seen.lock(), vec![GraphEvent::NodeAdded { node: NodeId(1) }]);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_event_json_tagging() {
        let json = serde_json::to_value(GraphEvent::GraphLoaded).unwrap();
        assert_eq!(json["type"], "graphLoaded");
    }
}
