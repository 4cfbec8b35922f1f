// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render/interaction surface for patch graphs.
//!
//! The canvas keeps its own mirror of nodes and connections, updated from
//! [`GraphEvent`]s, plus a pan/zoom [`Viewport`]. Raw pointer input runs
//! through a gesture state machine and comes out as [`CanvasEvent`]s; the
//! canvas never mutates the graph itself.
//!
//! Drawing goes through a display list ([`DrawCmd`]) so the frame layout can
//! be inspected without a GPU, then painted with egui.

pub mod geometry;
pub mod gesture;
pub mod hit_test;
pub mod render;
pub mod viewport;

pub use gesture::{CanvasEvent, Gesture, PointerEvent, WheelEvent};
pub use hit_test::{hit_test, HitTarget};
pub use render::{DrawCmd, LabelAlign};
pub use viewport::Viewport;

use crate::config::CanvasConfig;
use crate::connection::{Connection, ConnectionId};
use crate::events::GraphEvent;
use crate::graph::PatchGraph;
use crate::node::{GraphNode, NodeId};
use crate::port::PortType;
use egui::{Color32, Pos2, Vec2};
use indexmap::{IndexMap, IndexSet};

/// Port as drawn on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PortView {
    /// Label
    pub name: String,
    /// Data type (socket color, connect validation)
    pub port_type: PortType,
}

/// Node as drawn on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    /// Node id
    pub id: NodeId,
    /// Header title
    pub title: String,
    /// World position (top-left)
    pub position: Pos2,
    /// Input ports
    pub inputs: Vec<PortView>,
    /// Output ports
    pub outputs: Vec<PortView>,
    /// Whether the node references a scene object
    pub bound: bool,
}

impl NodeView {
    /// Snapshot a graph node for drawing
    pub fn from_node(node: &dyn GraphNode) -> Self {
        let data = node.data();
        let ports = |ports: &[crate::port::Port]| -> Vec<PortView> {
            ports
                .iter()
                .map(|p| PortView {
                    name: p.name.clone(),
                    port_type: p.port_type.clone(),
                })
                .collect()
        };
        Self {
            id: data.id,
            title: data.name.clone(),
            position: Pos2::new(data.position[0], data.position[1]),
            inputs: ports(&data.inputs),
            outputs: ports(&data.outputs),
            bound: node.bound_object().is_some(),
        }
    }
}

/// Selected nodes or selected connections, never both
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: IndexSet<NodeId>,
    connections: IndexSet<ConnectionId>,
}

impl Selection {
    /// Select a node; clears selected connections
    pub fn select_node(&mut self, node: NodeId, additive: bool) {
        self.connections.clear();
        if !additive {
            self.nodes.clear();
        }
        self.nodes.insert(node);
    }

    /// Select a connection; clears selected nodes
    pub fn select_connection(&mut self, connection: ConnectionId, additive: bool) {
        self.nodes.clear();
        if !additive {
            self.connections.clear();
        }
        self.connections.insert(connection);
    }

    /// Clear selection
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    /// Check whether a node is selected
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Check whether a connection is selected
    pub fn contains_connection(&self, connection: ConnectionId) -> bool {
        self.connections.contains(&connection)
    }

    /// Selected nodes, in selection order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Selected connections, in selection order
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.iter().copied()
    }

    fn forget_node(&mut self, node: NodeId) {
        self.nodes.shift_remove(&node);
    }

    fn forget_connection(&mut self, connection: ConnectionId) {
        self.connections.shift_remove(&connection);
    }
}

/// Interactive canvas for one patch graph
#[derive(Debug)]
pub struct PatchCanvas {
    config: CanvasConfig,
    viewport: Viewport,
    nodes: IndexMap<NodeId, NodeView>,
    connections: IndexMap<ConnectionId, Connection>,
    selection: Selection,
    gesture: Gesture,
    outbox: Vec<CanvasEvent>,
    size: Vec2,
    last_pointer: Option<Pos2>,
}

impl PatchCanvas {
    /// Create an empty canvas
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            config,
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            selection: Selection::default(),
            gesture: Gesture::Idle,
            outbox: Vec::new(),
            size: Vec2::new(800.0, 600.0),
            last_pointer: None,
        }
    }

    /// Canvas settings
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Current viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current gesture
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Mirrored node
    pub fn node_view(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.get(&id)
    }

    /// Mirrored nodes, in draw order
    pub fn node_views(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.values()
    }

    /// Mirrored connections
    pub fn connection_views(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Visible area size in screen pixels
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Set the visible area size (updated every frame by [`PatchCanvas::ui`])
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// World position at the center of the visible area
    pub fn viewport_center(&self) -> [f32; 2] {
        let center = self.viewport.screen_to_world((self.size / 2.0).to_pos2());
        [center.x, center.y]
    }

    /// Resolve a screen position against the mirror
    pub fn hit(&self, screen: Pos2) -> HitTarget {
        hit_test(
            &self.config,
            &self.viewport,
            &self.nodes,
            &self.connections,
            screen,
        )
    }

    /// Drain the semantic events produced since the last call
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn push_event(&mut self, event: CanvasEvent) {
        tracing::trace!(?event, "canvas event");
        self.outbox.push(event);
    }

    /// Select a node programmatically
    pub fn select_node(&mut self, node: NodeId, additive: bool) {
        if self.nodes.contains_key(&node) {
            self.selection.select_node(node, additive);
        }
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Ask for the current selection to be deleted
    pub fn request_delete(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let event = CanvasEvent::DeleteSelection {
            nodes: self.selection.nodes().collect(),
            connections: self.selection.connections().collect(),
        };
        self.push_event(event);
    }

    /// Rebuild the mirror from the graph
    pub fn sync_from_graph(&mut self, graph: &PatchGraph) {
        self.nodes = graph
            .nodes()
            .map(|n| (n.data().id, NodeView::from_node(n)))
            .collect();
        self.connections = graph.connections().map(|c| (c.id(), c.clone())).collect();

        let stale_nodes: Vec<NodeId> = self
            .selection
            .nodes()
            .filter(|id| !self.nodes.contains_key(id))
            .collect();
        for id in stale_nodes {
            self.selection.forget_node(id);
        }
        let stale_connections: Vec<ConnectionId> = self
            .selection
            .connections()
            .filter(|id| !self.connections.contains_key(id))
            .collect();
        for id in stale_connections {
            self.selection.forget_connection(id);
        }
    }

    /// Update the mirror from one engine event
    pub fn apply_event(&mut self, event: &GraphEvent, graph: &PatchGraph) {
        match event {
            GraphEvent::NodeAdded { node } => {
                if let Some(n) = graph.node(*node) {
                    self.nodes.insert(*node, NodeView::from_node(n));
                }
            }
            GraphEvent::NodeRemoved { node } => {
                self.nodes.shift_remove(node);
                self.selection.forget_node(*node);
                if matches!(self.gesture, Gesture::DraggingNode { node: dragged, .. } if dragged == *node) {
                    self.gesture = Gesture::Idle;
                }
            }
            GraphEvent::NodeMoved { node, position } => {
                if let Some(view) = self.nodes.get_mut(node) {
                    view.position = Pos2::new(position[0], position[1]);
                }
            }
            GraphEvent::ConnectionAdded { connection } => {
                self.connections
                    .insert(*connection, Connection::from(*connection));
            }
            GraphEvent::ConnectionRemoved { connection } => {
                self.connections.shift_remove(connection);
                self.selection.forget_connection(*connection);
            }
            GraphEvent::GraphLoaded => self.sync_from_graph(graph),
            GraphEvent::ObjectSelected { .. } | GraphEvent::SceneObjectUpdated { .. } => {}
        }
    }

    /// One-line summary for the status bar
    pub fn status_text(&self) -> String {
        let selected = self.selection.nodes().count() + self.selection.connections().count();
        format!(
            "Nodes: {} | Connections: {} | Zoom: {:.0}% | Selected: {}",
            self.nodes.len(),
            self.connections.len(),
            self.viewport.zoom() * 100.0,
            selected,
        )
    }

    /// Draw the canvas and translate this frame's input into events
    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        self.size = rect.size();
        let origin = rect.min.to_vec2();

        let (hover, pressed, released, scroll, modifiers, delete) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.raw_scroll_delta,
                i.modifiers,
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
            )
        });

        let local = hover.map(|p| p - origin);
        match local {
            Some(position) => {
                if pressed && response.hovered() {
                    self.handle_pointer(PointerEvent::Down {
                        position,
                        additive: modifiers.shift,
                    });
                } else if self.last_pointer != Some(position) {
                    self.handle_pointer(PointerEvent::Move { position });
                }
                if released {
                    self.handle_pointer(PointerEvent::Up { position });
                }
            }
            None => {
                if !matches!(self.gesture, Gesture::Idle) {
                    self.handle_pointer(PointerEvent::Leave);
                }
            }
        }
        self.last_pointer = local;

        if response.hovered() && scroll != Vec2::ZERO {
            if let Some(position) = local {
                self.handle_wheel(WheelEvent {
                    position,
                    delta: scroll,
                    modifiers,
                });
            }
        }

        if delete && response.hovered() {
            self.request_delete();
        }

        let painter = ui.painter_at(rect);
        render::paint(&self.display_list(), &painter, origin, self.viewport.zoom());
        painter.text(
            rect.left_bottom() + Vec2::new(5.0, -10.0),
            egui::Align2::LEFT_CENTER,
            self.status_text(),
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::builtin_registry;
    use crate::scene::Scene;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn graph_with_events() -> (PatchGraph, Arc<Mutex<Vec<GraphEvent>>>) {
        let mut graph = PatchGraph::new(builtin_registry(), Scene::new().into_shared());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        graph.subscribe(move |e| sink.lock().push(e.clone()));
        (graph, events)
    }

    fn drain(canvas: &mut PatchCanvas, graph: &PatchGraph, events: &Mutex<Vec<GraphEvent>>) {
        for event in events.lock().drain(..) {
            canvas.apply_event(&event, graph);
        }
    }

    #[test]
    fn test_mirror_follows_engine_events() {
        let (mut graph, events) = graph_with_events();
        let mut canvas = PatchCanvas::new(CanvasConfig::default());

        let a = graph.create_node("number", [0.0, 0.0], None).unwrap();
        let b = graph.create_node("sine", [300.0, 0.0], None).unwrap();
        let c = graph.add_connection(a, 0, b, 0).unwrap();
        graph.move_node(b, [320.0, 40.0]).unwrap();
        drain(&mut canvas, &graph, &events);

        assert_eq!(canvas.node_views().count(), 2);
        assert_eq!(canvas.connection_views().count(), 1);
        assert_eq!(canvas.node_view(b).unwrap().position, Pos2::new(320.0, 40.0));

        canvas.selection.select_connection(c, false);
        graph.remove_node(a).unwrap();
        drain(&mut canvas, &graph, &events);
        assert_eq!(canvas.node_views().count(), 1);
        assert_eq!(canvas.connection_views().count(), 0);
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn test_selection_is_mutually_exclusive() {
        let mut selection = Selection::default();
        let connection = ConnectionId::new(NodeId(1), 0, NodeId(2), 0);
        selection.select_node(NodeId(1), false);
        selection.select_node(NodeId(2), true);
        assert_eq!(selection.nodes().count(), 2);

        selection.select_connection(connection, false);
        assert_eq!(selection.nodes().count(), 0);
        assert!(selection.contains_connection(connection));

        selection.select_node(NodeId(3), false);
        assert!(!selection.contains_connection(connection));
    }

    #[test]
    fn test_delete_request_lists_selection() {
        let (mut graph, events) = graph_with_events();
        let mut canvas = PatchCanvas::new(CanvasConfig::default());
        let a = graph.create_node("number", [0.0, 0.0], None).unwrap();
        drain(&mut canvas, &graph, &events);

        canvas.request_delete();
        assert!(canvas.take_events().is_empty());

        canvas.select_node(a, false);
        canvas.request_delete();
        assert_eq!(
            canvas.take_events(),
            vec![CanvasEvent::DeleteSelection {
                nodes: vec![a],
                connections: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_viewport_center_and_status() {
        let mut canvas = PatchCanvas::new(CanvasConfig::default());
        canvas.set_size(Vec2::new(800.0, 600.0));
        canvas.viewport_mut().set_pan(Vec2::new(100.0, 0.0));
        assert_eq!(canvas.viewport_center(), [300.0, 300.0]);
        assert_eq!(
            canvas.status_text(),
            "Nodes: 0 | Connections: 0 | Zoom: 100% | Selected: 0"
        );
    }
}
