// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer hit testing.
//!
//! Priority, first match wins: sockets, then connections, then node bodies,
//! then empty space. Nodes drawn last are tested first.

use super::geometry::{connection_points, distance_to_polyline, input_socket, node_rect, output_socket};
use super::{NodeView, Viewport};
use crate::config::CanvasConfig;
use crate::connection::{Connection, ConnectionId};
use crate::node::NodeId;
use egui::Pos2;
use indexmap::IndexMap;

/// What lies under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// An output socket
    OutputSocket {
        /// Owning node
        node: NodeId,
        /// Output index
        index: usize,
    },
    /// An input socket
    InputSocket {
        /// Owning node
        node: NodeId,
        /// Input index
        index: usize,
    },
    /// A connection curve
    Connection(ConnectionId),
    /// The body of a node
    NodeBody(NodeId),
    /// Nothing
    Empty,
}

/// Resolve a screen position against the canvas contents
pub fn hit_test(
    config: &CanvasConfig,
    viewport: &Viewport,
    nodes: &IndexMap<NodeId, NodeView>,
    connections: &IndexMap<ConnectionId, Connection>,
    screen: Pos2,
) -> HitTarget {
    let world = viewport.screen_to_world(screen);
    // Sockets are tested in screen space so they stay grabbable when zoomed out
    let radius = (config.socket_radius * viewport.zoom()).max(config.min_socket_hit_radius);
    let near = |socket: Pos2| viewport.world_to_screen(socket).distance(screen) <= radius;

    for node in nodes.values().rev() {
        for index in 0..node.outputs.len() {
            if near(output_socket(config, node, index)) {
                return HitTarget::OutputSocket { node: node.id, index };
            }
        }
        for index in 0..node.inputs.len() {
            if near(input_socket(config, node, index)) {
                return HitTarget::InputSocket { node: node.id, index };
            }
        }
    }

    for connection in connections.values().rev() {
        let Some(points) = connection_points(config, viewport, nodes, connection) else {
            continue;
        };
        if distance_to_polyline(screen, &points) <= config.connection_tolerance {
            return HitTarget::Connection(connection.id());
        }
    }

    for node in nodes.values().rev() {
        if node_rect(config, node).contains(world) {
            return HitTarget::NodeBody(node.id);
        }
    }

    HitTarget::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PortView;
    use crate::port::PortType;

    fn node(id: u64, x: f32, y: f32) -> NodeView {
        let port = |name: &str| PortView {
            name: name.to_string(),
            port_type: PortType::Float,
        };
        NodeView {
            id: NodeId(id),
            title: "Node".to_string(),
            position: Pos2::new(x, y),
            inputs: vec![port("in")],
            outputs: vec![port("out")],
            bound: false,
        }
    }

    fn scene() -> (IndexMap<NodeId, NodeView>, IndexMap<ConnectionId, Connection>) {
        let mut nodes = IndexMap::new();
        nodes.insert(NodeId(1), node(1, 0.0, 0.0));
        nodes.insert(NodeId(2), node(2, 400.0, 0.0));
        let mut connections = IndexMap::new();
        let id = ConnectionId::new(NodeId(1), 0, NodeId(2), 0);
        connections.insert(id, Connection::from(id));
        (nodes, connections)
    }

    #[test]
    fn test_socket_wins_over_node_body() {
        let config = CanvasConfig::default();
        let viewport = Viewport::new(config.min_zoom, config.max_zoom);
        let (nodes, connections) = scene();
        // Output socket of node 1 sits at (140, 35); 2px inside the body
        let hit = hit_test(&config, &viewport, &nodes, &connections, Pos2::new(138.0, 35.0));
        assert_eq!(hit, HitTarget::OutputSocket { node: NodeId(1), index: 0 });
    }

    #[test]
    fn test_priority_order() {
        let config = CanvasConfig::default();
        let viewport = Viewport::new(config.min_zoom, config.max_zoom);
        let (nodes, connections) = scene();
        let hit = |x, y| hit_test(&config, &viewport, &nodes, &connections, Pos2::new(x, y));

        assert_eq!(hit(400.0, 35.0), HitTarget::InputSocket { node: NodeId(2), index: 0 });
        assert_eq!(
            hit(270.0, 36.0),
            HitTarget::Connection(ConnectionId::new(NodeId(1), 0, NodeId(2), 0))
        );
        assert_eq!(hit(60.0, 10.0), HitTarget::NodeBody(NodeId(1)));
        assert_eq!(hit(270.0, 300.0), HitTarget::Empty);
    }

    #[test]
    fn test_sockets_stay_grabbable_when_zoomed_out() {
        let config = CanvasConfig::default();
        let mut viewport = Viewport::new(config.min_zoom, config.max_zoom);
        viewport.set_zoom(config.min_zoom);
        let (nodes, connections) = scene();
        // Output socket of node 1 at world (140, 35) -> screen (14, 3.5)
        let hit = hit_test(&config, &viewport, &nodes, &connections, Pos2::new(18.0, 3.5));
        assert_eq!(hit, HitTarget::OutputSocket { node: NodeId(1), index: 0 });

        // At full zoom the world radius governs
        viewport.set_zoom(2.0);
        let hit = hit_test(&config, &viewport, &nodes, &connections, Pos2::new(290.0, 70.0));
        assert_eq!(hit, HitTarget::OutputSocket { node: NodeId(1), index: 0 });
    }

    #[test]
    fn test_hit_respects_viewport() {
        let config = CanvasConfig::default();
        let mut viewport = Viewport::new(config.min_zoom, config.max_zoom);
        viewport.set_zoom(2.0);
        viewport.set_pan(egui::Vec2::new(10.0, 10.0));
        let (nodes, connections) = scene();
        // World (60, 10) -> screen (130, 30)
        let hit = hit_test(&config, &viewport, &nodes, &connections, Pos2::new(130.0, 30.0));
        assert_eq!(hit, HitTarget::NodeBody(NodeId(1)));
    }
}
