// SPDX-License-Identifier: MIT OR Apache-2.0
//! The patch graph engine: nodes, connections, scene bindings and the
//! frame-driven evaluation loop.
//!
//! ## Evaluation model
//!
//! - [`PatchGraph::tick`] runs once per frame. It snapshots the evaluation
//!   queue, processes each node once, pushes changed outputs into connected
//!   inputs and queues the nodes one hop downstream for the *next* tick.
//! - External writes (an output set through the API, a new connection, a
//!   removed connection) take the immediate path: the affected node is
//!   processed synchronously once, and its own downstream is deferred to the
//!   queue. At most one immediate hop happens per external write.
//! - Scene objects notify a [`ChangeInbox`]; at the start of each tick bound
//!   nodes whose objects changed are resynchronized and queued.

use crate::binding::{ChangeInbox, SceneBinding};
use crate::config::GraphConfig;
use crate::connection::{Connection, ConnectionId};
use crate::evaluation::{EvaluationQueue, FrameTime, ProcessContext};
use crate::events::{EventChannel, GraphEvent, HostEvent, ListenerId};
use crate::layout::{smart_position, PlacedNode};
use crate::node::{GraphNode, NodeError, NodeId, SerializedNode};
use crate::port::{PortDirection, PortType, PortValue};
use crate::registry::{NodeRegistry, NodeSpawn, RegistryError};
use crate::scene::{ObjectId, SharedScene};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};

/// How a value written into an input is followed up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Process the target now (one hop)
    Immediate,
    /// Leave the target to the queue
    Deferred,
}

/// Marks a tick in progress; clears the flag on drop, unwinding included
struct EvaluationGuard<'a> {
    graph: &'a mut PatchGraph,
}

impl<'a> EvaluationGuard<'a> {
    fn enter(graph: &'a mut PatchGraph) -> Self {
        graph.is_evaluating = true;
        Self { graph }
    }
}

impl Deref for EvaluationGuard<'_> {
    type Target = PatchGraph;

    fn deref(&self) -> &PatchGraph {
        &*self.graph
    }
}

impl DerefMut for EvaluationGuard<'_> {
    fn deref_mut(&mut self) -> &mut PatchGraph {
        &mut *self.graph
    }
}

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.graph.is_evaluating = false;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Outcome of one evaluation tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Nodes whose `process()` ran
    pub processed: Vec<NodeId>,
    /// Nodes whose `process()` failed, with the error
    pub failed: Vec<(NodeId, NodeError)>,
    /// Whether the tick was skipped because one was already running
    pub skipped: bool,
}

/// A patch graph bound to a host scene
pub struct PatchGraph {
    /// Graph name
    pub name: String,
    registry: NodeRegistry,
    config: GraphConfig,
    nodes: IndexMap<NodeId, Box<dyn GraphNode>>,
    connections: IndexMap<ConnectionId, Connection>,
    bindings: HashMap<NodeId, SceneBinding>,
    scene: SharedScene,
    inbox: ChangeInbox,
    queue: EvaluationQueue,
    is_evaluating: bool,
    next_node_id: u64,
    time: FrameTime,
    selected_object: Option<ObjectId>,
    events: EventChannel<GraphEvent>,
}

impl std::fmt::Debug for PatchGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchGraph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("bindings", &self.bindings.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl PatchGraph {
    /// Create an empty graph over the given scene
    pub fn new(registry: NodeRegistry, scene: SharedScene) -> Self {
        Self::with_config(registry, scene, GraphConfig::default())
    }

    /// Create an empty graph with explicit placement settings
    pub fn with_config(registry: NodeRegistry, scene: SharedScene, config: GraphConfig) -> Self {
        Self {
            name: "Untitled".to_string(),
            registry,
            config,
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            bindings: HashMap::new(),
            scene,
            inbox: ChangeInbox::new(),
            queue: EvaluationQueue::new(),
            is_evaluating: false,
            next_node_id: 1,
            time: FrameTime::default(),
            selected_object: None,
            events: EventChannel::new(),
        }
    }

    /// Node type registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Shared scene handle
    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    /// Placement settings
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Current frame time
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Object last selected through [`HostEvent::ObjectSelected`] or [`PatchGraph::select_object`]
    pub fn selected_object(&self) -> Option<ObjectId> {
        self.selected_object
    }

    /// Listen to engine events
    pub fn subscribe(&mut self, listener: impl FnMut(&GraphEvent) + Send + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Stop listening
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, event: GraphEvent) {
        tracing::trace!(?event, "graph event");
        self.events.emit(&event);
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Id the next created node will receive
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.next_node_id)
    }

    /// Construct a node through the registry and register it
    pub fn create_node(
        &mut self,
        node_type: &str,
        position: [f32; 2],
        object: Option<ObjectId>,
    ) -> Result<NodeId, GraphError> {
        let id = self.next_node_id();
        self.create_node_with_id(id, node_type, position, object)
    }

    /// Construct a node with a caller-chosen id (redo, restore)
    pub fn create_node_with_id(
        &mut self,
        id: NodeId,
        node_type: &str,
        position: [f32; 2],
        object: Option<ObjectId>,
    ) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let node = self.registry.create(
            node_type,
            NodeSpawn {
                id,
                position,
                object,
            },
        )?;
        self.insert_node(node)
    }

    /// Re-create a node from its serialized form, keeping its id
    pub fn restore_node(&mut self, serialized: &SerializedNode) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&serialized.id) {
            return Err(GraphError::DuplicateNode(serialized.id));
        }
        let mut node = self.registry.create(
            &serialized.node_type,
            NodeSpawn {
                id: serialized.id,
                position: serialized.position,
                object: serialized.object,
            },
        )?;
        node.deserialize(serialized).map_err(|source| GraphError::Node {
            node: serialized.id,
            source,
        })?;
        self.insert_node(node)
    }

    /// Register an already constructed node
    pub fn insert_node(&mut self, mut node: Box<dyn GraphNode>) -> Result<NodeId, GraphError> {
        let id = node.data().id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        // Connection references are owned by the engine
        let data = node.data_mut();
        for port in &mut data.inputs {
            port.connection = None;
        }
        for port in &mut data.outputs {
            port.connections.clear();
        }

        // The counter must stay representable after this id
        let Some(next) = id.0.checked_add(1) else {
            return Err(GraphError::InvalidNodeId(id));
        };
        let object = node.bound_object();
        self.next_node_id = self.next_node_id.max(next);
        self.nodes.insert(id, node);

        if let Some(object) = object {
            self.attach_binding(id, object);
        }

        self.queue.push(id);
        tracing::debug!(node = %id, "node added");
        self.emit(GraphEvent::NodeAdded { node: id });
        Ok(id)
    }

    /// Remove a node: binding first, then its connections, then the node
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Box<dyn GraphNode>, GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }

        self.detach_binding(node_id);

        let touching: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.involves_node(node_id))
            .map(Connection::id)
            .collect();
        for id in touching {
            // The removed node itself does not need reprocessing
            self.detach_connection(id, id.to_node != node_id)?;
        }

        let node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        self.queue.remove(node_id);
        tracing::debug!(node = %node_id, "node removed");
        self.emit(GraphEvent::NodeRemoved { node: node_id });
        Ok(node)
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.data_mut().position = position;
        self.emit(GraphEvent::NodeMoved {
            node: node_id,
            position,
        });
        Ok(())
    }

    /// Update a property bag entry and queue the node
    pub fn set_property(&mut self, node_id: NodeId, key: &str, value: Value) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.data_mut().properties.insert(key.to_string(), value);
        self.queue.push(node_id);
        Ok(())
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&dyn GraphNode> {
        self.nodes.get(&node_id).map(|n| n.as_ref())
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut (dyn GraphNode + 'static)> {
        self.nodes.get_mut(&node_id).map(|n| n.as_mut())
    }

    /// Check whether a node is registered
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &dyn GraphNode> {
        self.nodes.values().map(|n| n.as_ref())
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node's type mirrors a scene object property
    pub fn mirrors_property(&self, node_type: &str) -> bool {
        self.registry.get(node_type).is_some_and(|t| t.mirrors_property)
    }

    /// Choose a position for a new node of `node_type`
    pub fn suggest_position(&self, node_type: &str, viewport_center: [f32; 2]) -> [f32; 2] {
        let placed: Vec<PlacedNode> = self
            .nodes
            .values()
            .map(|n| PlacedNode {
                position: n.data().position,
                mirrors_property: self.mirrors_property(&n.data().node_type),
            })
            .collect();
        smart_position(
            &self.config,
            &placed,
            self.mirrors_property(node_type),
            viewport_center,
        )
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    /// Connect `source.outputs[output]` to `target.inputs[input]`.
    ///
    /// An identical existing connection makes this a no-op returning its id.
    /// An input that already has a different connection rejects the new one.
    pub fn add_connection(
        &mut self,
        from_node: NodeId,
        from_output: usize,
        to_node: NodeId,
        to_input: usize,
    ) -> Result<ConnectionId, GraphError> {
        if from_node == to_node {
            return Err(GraphError::SelfLoop(from_node));
        }

        let source = self
            .nodes
            .get(&from_node)
            .ok_or(GraphError::NodeNotFound(from_node))?;
        let target = self
            .nodes
            .get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?;

        let source_port = source
            .data()
            .output(from_output)
            .ok_or(GraphError::PortNotFound {
                node: from_node,
                index: from_output,
                direction: PortDirection::Output,
            })?;
        let target_port = target
            .data()
            .input(to_input)
            .ok_or(GraphError::PortNotFound {
                node: to_node,
                index: to_input,
                direction: PortDirection::Input,
            })?;

        if !source_port.can_connect(target_port) {
            return Err(GraphError::IncompatiblePorts {
                from: source_port.port_type.clone(),
                to: target_port.port_type.clone(),
            });
        }

        let id = ConnectionId::new(from_node, from_output, to_node, to_input);
        if self.connections.contains_key(&id) {
            tracing::debug!(connection = %id, "duplicate connection ignored");
            return Ok(id);
        }

        if let Some(existing) = target_port.connection {
            tracing::warn!(
                connection = %id,
                existing = %existing,
                "input already connected; new connection rejected"
            );
            return Err(GraphError::InputAlreadyConnected {
                node: to_node,
                input: to_input,
                existing,
            });
        }

        let value = source_port.value.clone();
        self.connections.insert(id, Connection::from(id));
        if let Some(port) = self.output_port_mut(from_node, from_output) {
            port.connections.push(id);
        }
        if let Some(port) = self.input_port_mut(to_node, to_input) {
            port.connection = Some(id);
        }

        // Push the current value so the new link is not stale
        self.deliver(id, value, Delivery::Immediate);

        tracing::debug!(connection = %id, "connection added");
        self.emit(GraphEvent::ConnectionAdded { connection: id });
        Ok(id)
    }

    /// Remove a connection and reset its target input to the default value
    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection, GraphError> {
        self.detach_connection(id, true)
    }

    fn detach_connection(&mut self, id: ConnectionId, reprocess: bool) -> Result<Connection, GraphError> {
        let connection = self
            .connections
            .shift_remove(&id)
            .ok_or(GraphError::ConnectionNotFound(id))?;

        if let Some(port) = self.output_port_mut(id.from_node, id.from_output) {
            port.connections.retain(|c| *c != id);
        }
        if let Some(port) = self.input_port_mut(id.to_node, id.to_input) {
            port.connection = None;
            port.reset();
        }

        if reprocess && self.nodes.contains_key(&id.to_node) {
            if let Err(err) = self.evaluate_immediately(id.to_node) {
                tracing::warn!(node = %id.to_node, error = %err, "reprocessing after disconnect failed");
            }
        }

        tracing::debug!(connection = %id, "connection removed");
        self.emit(GraphEvent::ConnectionRemoved { connection: id });
        Ok(connection)
    }

    /// Get a connection by ID
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn output_port_mut(&mut self, node: NodeId, index: usize) -> Option<&mut crate::port::Port> {
        self.nodes.get_mut(&node)?.data_mut().outputs.get_mut(index)
    }

    fn input_port_mut(&mut self, node: NodeId, index: usize) -> Option<&mut crate::port::Port> {
        self.nodes.get_mut(&node)?.data_mut().inputs.get_mut(index)
    }

    // ---------------------------------------------------------------------
    // Values and evaluation
    // ---------------------------------------------------------------------

    /// Write an output value from outside the graph.
    ///
    /// Connected inputs receive the value immediately and their nodes are
    /// processed once; anything further downstream waits for the next tick.
    pub fn set_output_value(&mut self, node_id: NodeId, output: usize, value: PortValue) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.data_mut()
            .set_output(output, value)
            .map_err(|_| GraphError::PortNotFound {
                node: node_id,
                index: output,
                direction: PortDirection::Output,
            })?;
        self.flush_outputs(node_id, Delivery::Immediate);
        Ok(())
    }

    /// Edit the value of an input (meaningful for unconnected inputs) and queue its node
    pub fn set_input_value(&mut self, node_id: NodeId, input: usize, value: PortValue) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        let port = self
            .input_port_mut(node_id, input)
            .ok_or(GraphError::PortNotFound {
                node: node_id,
                index: input,
                direction: PortDirection::Input,
            })?;
        let value = value.coerce_to(&port.port_type).unwrap_or(value);
        if port.set_value(value) {
            self.queue.push(node_id);
        }
        Ok(())
    }

    /// Current value of an input
    pub fn input_value(&self, node_id: NodeId, input: usize) -> Option<&PortValue> {
        self.nodes.get(&node_id)?.data().input_value(input)
    }

    /// Current value of an output
    pub fn output_value(&self, node_id: NodeId, output: usize) -> Option<&PortValue> {
        self.nodes.get(&node_id)?.data().output_value(output)
    }

    /// Queue a node for the next tick; returns false if already queued
    pub fn queue_node(&mut self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id) && self.queue.push(node_id)
    }

    /// Nodes awaiting evaluation
    pub fn queue(&self) -> &EvaluationQueue {
        &self.queue
    }

    /// Whether a tick is in progress
    pub fn is_evaluating(&self) -> bool {
        self.is_evaluating
    }

    /// Run one evaluation tick; call once per frame.
    ///
    /// Every node queued before the tick is processed exactly once. Nodes it
    /// triggers are queued for the following tick.
    pub fn tick(&mut self, delta_seconds: f64) -> TickReport {
        if self.is_evaluating {
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }

        self.time.delta = delta_seconds;
        self.time.elapsed += delta_seconds;
        self.time.frame += 1;

        self.sync_changed_objects();
        let animated: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.is_animated())
            .map(|(id, _)| *id)
            .collect();
        for id in animated {
            self.queue.push(id);
        }

        let mut report = TickReport::default();
        if self.queue.is_empty() {
            return report;
        }

        let mut graph = EvaluationGuard::enter(self);
        let snapshot = graph.queue.take();
        for node_id in snapshot {
            if !graph.nodes.contains_key(&node_id) {
                continue;
            }
            match graph.process_node(node_id) {
                Ok(()) => {
                    report.processed.push(node_id);
                    graph.flush_outputs(node_id, Delivery::Deferred);
                    graph.propagate_node_changes(node_id);
                    graph.notify_bound_object(node_id);
                }
                Err(GraphError::Node { node, source }) => {
                    tracing::warn!(node = %node, error = %source, "node processing failed");
                    report.failed.push((node, source));
                }
                Err(err) => {
                    tracing::warn!(node = %node_id, error = %err, "node evaluation skipped");
                }
            }
        }

        tracing::trace!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            pending = graph.queue.len(),
            "tick complete"
        );
        report
    }

    /// Process a node synchronously once and queue its direct downstream
    pub fn evaluate_immediately(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.process_node(node_id)?;
        self.flush_outputs(node_id, Delivery::Deferred);
        self.propagate_node_changes(node_id);
        self.notify_bound_object(node_id);
        Ok(())
    }

    fn process_node(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let mut scene = self.scene.write();
        let object = match self.bindings.get(&node_id) {
            Some(binding) => scene.get_mut(binding.object),
            None => None,
        };
        let mut ctx = ProcessContext::new(self.time, object);
        tracing::trace!(node = %node_id, "process");
        let result = panic::catch_unwind(AssertUnwindSafe(|| node.process(&mut ctx)))
            .unwrap_or_else(|payload| Err(NodeError::Panicked(panic_message(payload.as_ref()))));
        result.map_err(|source| GraphError::Node { node: node_id, source })
    }

    /// Push every output written since the last flush along its connections
    fn flush_outputs(&mut self, node_id: NodeId, mode: Delivery) {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return;
        };
        let changed = node.data_mut().take_changed_outputs();
        let mut writes = Vec::new();
        for index in changed {
            if let Some(port) = node.data().output(index) {
                for id in &port.connections {
                    writes.push((*id, port.value.clone()));
                }
            }
        }
        for (id, value) in writes {
            self.deliver(id, value, mode);
        }
    }

    fn deliver(&mut self, id: ConnectionId, value: PortValue, mode: Delivery) {
        let Some(port) = self.input_port_mut(id.to_node, id.to_input) else {
            return;
        };
        let Some(value) = value.coerce_to(&port.port_type) else {
            tracing::debug!(connection = %id, "value not convertible to input type");
            return;
        };
        let changed = port.set_value(value);

        if changed && mode == Delivery::Immediate {
            if let Err(err) = self.evaluate_immediately(id.to_node) {
                tracing::warn!(node = %id.to_node, error = %err, "immediate evaluation failed");
            }
        }
    }

    /// Queue every node one connection hop downstream of `node_id`
    fn propagate_node_changes(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.get(&node_id) else {
            return;
        };
        let downstream: Vec<NodeId> = node
            .data()
            .outputs
            .iter()
            .flat_map(|p| p.connections.iter().map(|c| c.to_node))
            .collect();
        for id in downstream {
            self.queue.push(id);
        }
    }

    fn notify_bound_object(&mut self, node_id: NodeId) {
        if let Some(object) = self.bindings.get(&node_id).map(|b| b.object) {
            self.emit(GraphEvent::SceneObjectUpdated { object });
        }
    }

    // ---------------------------------------------------------------------
    // Scene bindings
    // ---------------------------------------------------------------------

    fn attach_binding(&mut self, node_id: NodeId, object: ObjectId) -> bool {
        let mut scene = self.scene.write();
        let Some(binding) = SceneBinding::attach(&mut scene, node_id, object, &self.inbox) else {
            tracing::warn!(node = %node_id, object = %object, "bound object not in scene; node is inert");
            return false;
        };
        if let (Some(node), Some(live)) = (self.nodes.get_mut(&node_id), scene.get(object)) {
            node.sync_from_object(live);
        }
        drop(scene);
        self.bindings.insert(node_id, binding);
        true
    }

    fn detach_binding(&mut self, node_id: NodeId) {
        if let Some(binding) = self.bindings.remove(&node_id) {
            binding.detach(&mut self.scene.write());
        }
    }

    /// Binding of a node, if it is live
    pub fn binding(&self, node_id: NodeId) -> Option<&SceneBinding> {
        self.bindings.get(&node_id)
    }

    /// Nodes currently bound to `object`
    pub fn nodes_bound_to(&self, object: ObjectId) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .bindings
            .values()
            .filter(|b| b.object == object)
            .map(|b| b.node)
            .collect();
        nodes.sort();
        nodes
    }

    /// Resynchronize bound nodes whose objects reported tracked changes
    pub fn sync_changed_objects(&mut self) {
        for object in self.inbox.drain_objects() {
            self.resync_object(object);
        }
    }

    fn resync_object(&mut self, object: ObjectId) {
        let nodes = self.nodes_bound_to(object);
        if nodes.is_empty() {
            return;
        }
        let scene = self.scene.read();
        let Some(live) = scene.get(object) else {
            return;
        };
        for node_id in nodes {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                if node.sync_from_object(live) {
                    self.queue.push(node_id);
                }
            }
        }
    }

    /// Select a scene object from the graph side (e.g. clicking a bound node)
    pub fn select_object(&mut self, object: ObjectId) {
        self.selected_object = Some(object);
        self.emit(GraphEvent::ObjectSelected { object });
    }

    /// React to a notification from the host editor
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::ObjectSelected(object) => self.select_object(object),
            HostEvent::ObjectChanged(object) => self.resync_object(object),
            HostEvent::ObjectAdded(object) => {
                let waiting: Vec<NodeId> = self
                    .nodes
                    .iter()
                    .filter(|(id, n)| n.bound_object() == Some(object) && !self.bindings.contains_key(*id))
                    .map(|(id, _)| *id)
                    .collect();
                for node_id in waiting {
                    if self.attach_binding(node_id, object) {
                        self.queue.push(node_id);
                    }
                }
            }
            HostEvent::ObjectRemoved(object) => {
                for node_id in self.nodes_bound_to(object) {
                    self.detach_binding(node_id);
                    tracing::debug!(node = %node_id, object = %object, "binding dropped");
                }
                if self.selected_object == Some(object) {
                    self.selected_object = None;
                }
            }
        }
    }

    /// Remove every node and connection
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            if let Err(err) = self.remove_node(id) {
                tracing::warn!(node = %id, error = %err, "failed to remove node while clearing");
            }
        }
        self.queue.clear();
        self.next_node_id = 1;
    }

    /// Recompute the id counter as one past the largest id in use
    pub(crate) fn recompute_next_id(&mut self) {
        self.next_node_id = self.nodes.keys().map(|id| id.0).max().map_or(1, |max| max.saturating_add(1));
    }

    pub(crate) fn emit_loaded(&mut self) {
        self.emit(GraphEvent::GraphLoaded);
    }
}

/// Error from a graph mutation
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Node {node} has no {direction:?} port {index}")]
    PortNotFound {
        /// Node id
        node: NodeId,
        /// Port index
        index: usize,
        /// Port direction
        direction: PortDirection,
    },

    /// Incompatible port types
    #[error("Incompatible port types: {from:?} -> {to:?}")]
    IncompatiblePorts {
        /// Source type
        from: PortType,
        /// Target type
        to: PortType,
    },

    /// Input already fed by another connection
    #[error("Input {input} of {node} is already connected by {existing}")]
    InputAlreadyConnected {
        /// Target node
        node: NodeId,
        /// Target input index
        input: usize,
        /// The live connection
        existing: ConnectionId,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed on {0}")]
    SelfLoop(NodeId),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Node id already in use
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Node id outside the usable range
    #[error("Invalid node id: {0}")]
    InvalidNodeId(NodeId),

    /// Registry could not build the node
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A node failed
    #[error("Node {node} failed: {source}")]
    Node {
        /// Node id
        node: NodeId,
        /// Underlying error
        #[source]
        source: NodeError,
    },
}
