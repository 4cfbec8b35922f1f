// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor controller: the glue between canvas, commands and engine.
//!
//! Canvas events become commands, commands mutate the engine, and the engine's
//! events are fed back into the canvas mirror. Engine events are collected by
//! a listener and applied to the canvas after each mutation.

use crate::commands::{
    AddConnectionCommand, AddNodeCommand, BatchCommand, CommandError, GraphCommand, MoveNodeCommand,
    RemoveConnectionCommand, RemoveNodeCommand,
};
use crate::config::EditorConfig;
use crate::history::{History, HistoryError, OperationId};
use crate::persistence::{self, PersistenceError};
use parking_lot::Mutex;
use scenepatch_graph::{
    CanvasEvent, ConnectionId, GraphEvent, HostEvent, NodeId, NodeRegistry, ObjectId, PatchCanvas, PatchGraph,
    RestoreReport, SharedScene, TickReport,
};
use std::path::Path;
use std::sync::Arc;

/// A patch graph being edited on a canvas with undo history
pub struct PatchEditor {
    graph: PatchGraph,
    canvas: PatchCanvas,
    history: History,
    pending: Arc<Mutex<Vec<GraphEvent>>>,
    dragging: Option<NodeId>,
}

impl PatchEditor {
    /// Create an editor over an empty graph
    pub fn new(config: &EditorConfig, registry: NodeRegistry, scene: SharedScene) -> Self {
        let mut graph = PatchGraph::with_config(registry, scene, config.graph.clone());
        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = pending.clone();
        graph.subscribe(move |event: &GraphEvent| sink.lock().push(event.clone()));

        let mut canvas = PatchCanvas::new(config.canvas.clone());
        canvas.sync_from_graph(&graph);

        Self {
            graph,
            canvas,
            history: History::with_max_depth(config.history_depth),
            pending,
            dragging: None,
        }
    }

    /// The engine
    pub fn graph(&self) -> &PatchGraph {
        &self.graph
    }

    /// Mutable engine access; changes bypass the history
    pub fn graph_mut(&mut self) -> &mut PatchGraph {
        &mut self.graph
    }

    /// The canvas
    pub fn canvas(&self) -> &PatchCanvas {
        &self.canvas
    }

    /// Mutable canvas access, for feeding input
    pub fn canvas_mut(&mut self) -> &mut PatchCanvas {
        &mut self.canvas
    }

    /// The undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply engine events collected since the last call to the canvas mirror
    pub fn sync_canvas(&mut self) {
        let events = std::mem::take(&mut *self.pending.lock());
        for event in &events {
            self.canvas.apply_event(event, &self.graph);
        }
    }

    /// Execute a command through the history
    pub fn execute(&mut self, command: Box<dyn GraphCommand>) -> Result<OperationId, CommandError> {
        let result = self.history.execute(command, &mut self.graph);
        self.sync_canvas();
        result
    }

    /// Add a node placed by smart positioning around the viewport center
    pub fn add_node(&mut self, node_type: &str, object: Option<ObjectId>) -> Result<NodeId, CommandError> {
        let position = self
            .graph
            .suggest_position(node_type, self.canvas.viewport_center());
        self.add_node_at(node_type, position, object)
    }

    /// Add a node at a world position
    pub fn add_node_at(
        &mut self,
        node_type: &str,
        position: [f32; 2],
        object: Option<ObjectId>,
    ) -> Result<NodeId, CommandError> {
        let command = AddNodeCommand::new(self.graph.next_node_id(), node_type, position, object);
        let node = command.node();
        self.execute(Box::new(command))?;
        Ok(node)
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node: NodeId) -> Result<OperationId, CommandError> {
        self.execute(Box::new(RemoveNodeCommand::new(node)))
    }

    /// Move a node to a world position
    pub fn move_node(&mut self, node: NodeId, position: [f32; 2]) -> Result<OperationId, CommandError> {
        let from = self
            .graph
            .node(node)
            .ok_or(CommandError::NodeNotFound(node))?
            .data()
            .position;
        self.execute(Box::new(MoveNodeCommand::new(node, from, position)))
    }

    /// Connect an output to an input
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_output: usize,
        to_node: NodeId,
        to_input: usize,
    ) -> Result<ConnectionId, CommandError> {
        let command = AddConnectionCommand::new(from_node, from_output, to_node, to_input);
        let id = command.connection();
        self.execute(Box::new(command))?;
        Ok(id)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<OperationId, CommandError> {
        self.execute(Box::new(RemoveConnectionCommand::new(connection)))
    }

    /// Remove nodes and connections as one undo step
    pub fn delete(
        &mut self,
        nodes: &[NodeId],
        connections: &[ConnectionId],
    ) -> Result<Option<OperationId>, CommandError> {
        // Explicit connections first; node removal cascades over the rest
        let mut commands: Vec<Box<dyn GraphCommand>> = connections
            .iter()
            .filter(|c| !nodes.contains(&c.from_node) && !nodes.contains(&c.to_node))
            .map(|c| Box::new(RemoveConnectionCommand::new(*c)) as Box<dyn GraphCommand>)
            .collect();
        commands.extend(
            nodes
                .iter()
                .map(|n| Box::new(RemoveNodeCommand::new(*n)) as Box<dyn GraphCommand>),
        );
        if commands.is_empty() {
            return Ok(None);
        }
        let batch = BatchCommand::new("Delete selection", commands);
        self.execute(Box::new(batch)).map(Some)
    }

    /// Undo the last step
    pub fn undo(&mut self) -> Result<OperationId, HistoryError> {
        self.dragging = None;
        let result = self.history.undo(&mut self.graph);
        self.sync_canvas();
        result
    }

    /// Redo the last undone step
    pub fn redo(&mut self) -> Result<OperationId, HistoryError> {
        self.dragging = None;
        let result = self.history.redo(&mut self.graph);
        self.sync_canvas();
        result
    }

    /// Turn one canvas event into engine calls.
    ///
    /// Rejected edits are logged; the canvas has no way to act on an error.
    pub fn handle_canvas_event(&mut self, event: CanvasEvent) {
        match event {
            CanvasEvent::NodeClick { node } => {
                let object = self.graph.node(node).and_then(|n| n.bound_object());
                if let Some(object) = object {
                    self.graph.select_object(object);
                }
            }
            CanvasEvent::ConnectionComplete {
                from_node_id,
                from_output_index,
                to_node_id,
                to_input_index,
            } => {
                if let Err(err) = self.connect(from_node_id, from_output_index, to_node_id, to_input_index) {
                    tracing::warn!(error = %err, "connection rejected");
                }
            }
            CanvasEvent::NodeDrag { node, delta } => {
                if self.dragging != Some(node) {
                    self.history.begin_gesture();
                    self.dragging = Some(node);
                }
                let Some(from) = self.graph.node(node).map(|n| n.data().position) else {
                    return;
                };
                let to = [from[0] + delta[0], from[1] + delta[1]];
                if let Err(err) = self.execute(Box::new(MoveNodeCommand::new(node, from, to))) {
                    tracing::warn!(node = %node, error = %err, "move failed");
                }
            }
            CanvasEvent::NodeDragEnd { .. } => {
                self.history.end_gesture();
                self.dragging = None;
            }
            CanvasEvent::DeleteSelection { nodes, connections } => {
                if let Err(err) = self.delete(&nodes, &connections) {
                    tracing::warn!(error = %err, "delete failed");
                }
            }
            CanvasEvent::ConnectionClick { .. }
            | CanvasEvent::ConnectionStart { .. }
            | CanvasEvent::ConnectionCancelled
            | CanvasEvent::EmptySpaceClick => {
                tracing::trace!(?event, "canvas event");
            }
        }
    }

    /// Drain and handle the canvas's pending events
    pub fn handle_canvas_events(&mut self) {
        for event in self.canvas.take_events() {
            self.handle_canvas_event(event);
        }
    }

    /// Forward a host notification to the engine
    pub fn handle_host_event(&mut self, event: HostEvent) {
        self.graph.handle_host_event(event);
        self.sync_canvas();
    }

    /// Run one frame of evaluation
    pub fn tick(&mut self, delta_seconds: f64) -> TickReport {
        let report = self.graph.tick(delta_seconds);
        self.sync_canvas();
        report
    }

    /// Write the graph to a `.json` or `.ron` file
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_document(path, &self.graph.serialize())
    }

    /// Replace the graph with a file's contents; history is cleared
    pub fn load(&mut self, path: &Path) -> Result<RestoreReport, PersistenceError> {
        let document = persistence::load_document(path)?;
        let report = self.graph.deserialize(&document);
        self.history.clear();
        self.dragging = None;
        self.sync_canvas();
        Ok(report)
    }

    /// Draw the canvas, then handle its events and the undo shortcuts
    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (undo, redo) = ui.input_mut(|i| {
            let redo = i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y);
            let undo = i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z);
            (undo, redo)
        });
        if redo {
            if let Err(err) = self.redo() {
                tracing::debug!(error = %err, "redo");
            }
        } else if undo {
            if let Err(err) = self.undo() {
                tracing::debug!(error = %err, "undo");
            }
        }

        let response = self.canvas.ui(ui);
        self.handle_canvas_events();
        response
    }
}
