// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame display list and egui painting.
//!
//! Layers, back to front: grid, connections, connection preview, then each
//! node followed by its sockets and labels.

use super::geometry::{
    bezier_points, connection_curve, connection_points, input_socket, node_rect, output_socket,
    CURVE_SEGMENTS,
};
use super::{Gesture, PatchCanvas};
use crate::connection::ConnectionId;
use crate::node::NodeId;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// Grid lines closer than this (screen pixels) are not drawn
const MIN_GRID_STEP: f32 = 4.0;
/// Every n-th grid line is a major line
const MAJOR_GRID_EVERY: i64 = 5;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;
const CONNECTION_THICKNESS: f32 = 2.5;
const LABEL_INSET: f32 = 12.0;

/// Horizontal anchoring of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAlign {
    /// Text starts at the position
    Left,
    /// Text ends at the position
    Right,
}

/// One drawing primitive, in canvas screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Background grid line
    GridLine {
        /// Start
        from: Pos2,
        /// End
        to: Pos2,
        /// Major line
        major: bool,
    },
    /// Established connection
    Connection {
        /// Connection id
        id: ConnectionId,
        /// Curve polyline
        points: Vec<Pos2>,
        /// Source port color
        color: [u8; 3],
        /// Selected
        selected: bool,
    },
    /// Connection being drawn
    Preview {
        /// Curve polyline
        points: Vec<Pos2>,
        /// Source port color
        color: [u8; 3],
    },
    /// Node body with header and title
    Node {
        /// Node id
        id: NodeId,
        /// Screen rectangle
        rect: Rect,
        /// Title
        title: String,
        /// Selected (outlined)
        selected: bool,
        /// Bound to a scene object
        bound: bool,
    },
    /// Port socket
    Socket {
        /// Center
        center: Pos2,
        /// Radius
        radius: f32,
        /// Port type color
        color: [u8; 3],
    },
    /// Port label
    Label {
        /// Anchor
        position: Pos2,
        /// Text
        text: String,
        /// Anchoring
        align: LabelAlign,
    },
}

impl PatchCanvas {
    /// Build this frame's drawing primitives
    pub fn display_list(&self) -> Vec<DrawCmd> {
        let mut commands = Vec::new();
        self.push_grid(&mut commands);

        for connection in self.connections.values() {
            let Some(points) = connection_points(&self.config, &self.viewport, &self.nodes, connection)
            else {
                continue;
            };
            let color = self
                .nodes
                .get(&connection.from_node)
                .and_then(|n| n.outputs.get(connection.from_output))
                .map_or([150, 150, 150], |p| p.port_type.color());
            commands.push(DrawCmd::Connection {
                id: connection.id(),
                points,
                color,
                selected: self.selection.contains_connection(connection.id()),
            });
        }

        if let Gesture::DrawingConnection {
            from_node,
            from_output,
            cursor,
        } = self.gesture
        {
            if let Some(node) = self.nodes.get(&from_node) {
                let start = self
                    .viewport
                    .world_to_screen(output_socket(&self.config, node, from_output));
                let color = node
                    .outputs
                    .get(from_output)
                    .map_or([150, 150, 150], |p| p.port_type.color());
                let curve = connection_curve(
                    start,
                    cursor,
                    self.config.bezier_curvature * self.viewport.zoom(),
                );
                commands.push(DrawCmd::Preview {
                    points: bezier_points(curve, CURVE_SEGMENTS),
                    color,
                });
            }
        }

        let zoom = self.viewport.zoom();
        let radius = self.config.socket_radius * zoom;
        for node in self.nodes.values() {
            let world = node_rect(&self.config, node);
            commands.push(DrawCmd::Node {
                id: node.id,
                rect: Rect::from_min_size(self.viewport.world_to_screen(world.min), world.size() * zoom),
                title: node.title.clone(),
                selected: self.selection.contains_node(node.id),
                bound: node.bound,
            });

            for (index, port) in node.inputs.iter().enumerate() {
                let center = self
                    .viewport
                    .world_to_screen(input_socket(&self.config, node, index));
                commands.push(DrawCmd::Socket {
                    center,
                    radius,
                    color: port.port_type.color(),
                });
                commands.push(DrawCmd::Label {
                    position: center + Vec2::new(LABEL_INSET * zoom, 0.0),
                    text: port.name.clone(),
                    align: LabelAlign::Left,
                });
            }
            for (index, port) in node.outputs.iter().enumerate() {
                let center = self
                    .viewport
                    .world_to_screen(output_socket(&self.config, node, index));
                commands.push(DrawCmd::Socket {
                    center,
                    radius,
                    color: port.port_type.color(),
                });
                commands.push(DrawCmd::Label {
                    position: center - Vec2::new(LABEL_INSET * zoom, 0.0),
                    text: port.name.clone(),
                    align: LabelAlign::Right,
                });
            }
        }

        commands
    }

    fn push_grid(&self, commands: &mut Vec<DrawCmd>) {
        let step = self.config.grid_spacing * self.viewport.zoom();
        if step < MIN_GRID_STEP {
            return;
        }
        let pan = self.viewport.pan();
        let size = self.size;

        let first = (-pan.x / step).ceil() as i64;
        let mut index = first;
        loop {
            let x = pan.x + index as f32 * step;
            if x > size.x {
                break;
            }
            commands.push(DrawCmd::GridLine {
                from: Pos2::new(x, 0.0),
                to: Pos2::new(x, size.y),
                major: index.rem_euclid(MAJOR_GRID_EVERY) == 0,
            });
            index += 1;
        }

        let first = (-pan.y / step).ceil() as i64;
        let mut index = first;
        loop {
            let y = pan.y + index as f32 * step;
            if y > size.y {
                break;
            }
            commands.push(DrawCmd::GridLine {
                from: Pos2::new(0.0, y),
                to: Pos2::new(size.x, y),
                major: index.rem_euclid(MAJOR_GRID_EVERY) == 0,
            });
            index += 1;
        }
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

fn polyline(painter: &egui::Painter, points: &[Pos2], origin: Vec2, stroke: Stroke) {
    for pair in points.windows(2) {
        painter.line_segment([pair[0] + origin, pair[1] + origin], stroke);
    }
}

/// Paint a display list; `origin` is the canvas top-left in window coordinates
pub fn paint(commands: &[DrawCmd], painter: &egui::Painter, origin: Vec2, zoom: f32) {
    let grid_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
    let grid_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

    for command in commands {
        match command {
            DrawCmd::GridLine { from, to, major } => {
                let color = if *major { grid_major } else { grid_minor };
                painter.line_segment([*from + origin, *to + origin], Stroke::new(1.0, color));
            }
            DrawCmd::Connection {
                points,
                color,
                selected,
                ..
            } => {
                let stroke = if *selected {
                    Stroke::new(CONNECTION_THICKNESS * zoom * 1.5, Color32::WHITE)
                } else {
                    Stroke::new(CONNECTION_THICKNESS * zoom, rgb(*color))
                };
                polyline(painter, points, origin, stroke);
            }
            DrawCmd::Preview { points, color } => {
                let [r, g, b] = *color;
                let stroke = Stroke::new(
                    CONNECTION_THICKNESS * zoom,
                    Color32::from_rgba_unmultiplied(r, g, b, 160),
                );
                polyline(painter, points, origin, stroke);
            }
            DrawCmd::Node {
                rect,
                title,
                selected,
                bound,
                ..
            } => {
                let rect = rect.translate(origin);
                let rounding = NODE_ROUNDING * zoom;
                painter.rect_filled(
                    rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
                    rounding,
                    Color32::from_rgba_unmultiplied(0, 0, 0, 60),
                );
                let background = if *selected {
                    Color32::from_rgb(60, 70, 90)
                } else {
                    Color32::from_rgb(45, 45, 48)
                };
                painter.rect_filled(rect, rounding, background);

                let header = Rect::from_min_size(rect.min, Vec2::new(rect.width(), 24.0 * zoom));
                let header_color = if *bound {
                    Color32::from_rgb(90, 120, 70)
                } else {
                    Color32::from_rgb(70, 100, 130)
                };
                painter.rect_filled(
                    header,
                    egui::Rounding {
                        nw: rounding,
                        ne: rounding,
                        sw: 0.0,
                        se: 0.0,
                    },
                    header_color,
                );
                painter.text(
                    header.center(),
                    egui::Align2::CENTER_CENTER,
                    title,
                    egui::FontId::proportional(12.0 * zoom),
                    Color32::WHITE,
                );

                if *selected {
                    painter.rect_stroke(
                        rect,
                        rounding,
                        Stroke::new(2.0, Color32::from_rgb(100, 150, 255)),
                    );
                }
            }
            DrawCmd::Socket {
                center,
                radius,
                color,
            } => {
                painter.circle_filled(*center + origin, *radius, rgb(*color));
                painter.circle_stroke(*center + origin, *radius, Stroke::new(1.0, Color32::from_gray(30)));
            }
            DrawCmd::Label {
                position,
                text,
                align,
            } => {
                let anchor = match align {
                    LabelAlign::Left => egui::Align2::LEFT_CENTER,
                    LabelAlign::Right => egui::Align2::RIGHT_CENTER,
                };
                painter.text(
                    *position + origin,
                    anchor,
                    text,
                    egui::FontId::proportional(10.0 * zoom),
                    Color32::from_gray(200),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{NodeView, PointerEvent, PortView};
    use crate::config::CanvasConfig;
    use crate::connection::Connection;
    use crate::port::PortType;

    fn canvas() -> PatchCanvas {
        let mut canvas = PatchCanvas::new(CanvasConfig::default());
        canvas.set_size(Vec2::new(600.0, 400.0));
        for (id, x) in [(1, 0.0), (2, 300.0)] {
            canvas.nodes.insert(
                NodeId(id),
                NodeView {
                    id: NodeId(id),
                    title: format!("Node {id}"),
                    position: Pos2::new(x, 0.0),
                    inputs: vec![PortView {
                        name: "in".to_string(),
                        port_type: PortType::Float,
                    }],
                    outputs: vec![PortView {
                        name: "out".to_string(),
                        port_type: PortType::Float,
                    }],
                    bound: false,
                },
            );
        }
        let id = ConnectionId::new(NodeId(1), 0, NodeId(2), 0);
        canvas.connections.insert(id, Connection::from(id));
        canvas
    }

    fn layer(command: &DrawCmd) -> u8 {
        match command {
            DrawCmd::GridLine { .. } => 0,
            DrawCmd::Connection { .. } => 1,
            DrawCmd::Preview { .. } => 2,
            DrawCmd::Node { .. } | DrawCmd::Socket { .. } | DrawCmd::Label { .. } => 3,
        }
    }

    #[test]
    fn test_layer_order() {
        let mut canvas = canvas();
        canvas.handle_pointer(PointerEvent::Down {
            position: Pos2::new(140.0, 35.0),
            additive: false,
        });
        canvas.handle_pointer(PointerEvent::Move {
            position: Pos2::new(200.0, 200.0),
        });

        let commands = canvas.display_list();
        let layers: Vec<u8> = commands.iter().map(layer).collect();
        assert!(layers.windows(2).all(|w| w[0] <= w[1]));
        assert!(layers.contains(&0));
        assert_eq!(layers.iter().filter(|l| **l == 2).count(), 1);

        // Each node is followed by its own sockets and labels
        let first_node = commands
            .iter()
            .position(|c| matches!(c, DrawCmd::Node { .. }))
            .unwrap();
        assert!(matches!(commands[first_node + 1], DrawCmd::Socket { .. }));
        assert!(matches!(commands[first_node + 2], DrawCmd::Label { .. }));
    }

    #[test]
    fn test_selection_is_reflected() {
        let mut canvas = canvas();
        let id = ConnectionId::new(NodeId(1), 0, NodeId(2), 0);
        canvas.selection.select_connection(id, false);
        let selected_connection = canvas
            .display_list()
            .into_iter()
            .any(|c| matches!(c, DrawCmd::Connection { selected: true, .. }));
        assert!(selected_connection);

        canvas.select_node(NodeId(2), false);
        let outlined: Vec<NodeId> = canvas
            .display_list()
            .into_iter()
            .filter_map(|c| match c {
                DrawCmd::Node { id, selected: true, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(outlined, vec![NodeId(2)]);
    }

    #[test]
    fn test_grid_follows_zoom() {
        let mut canvas = canvas();
        let lines = |c: &PatchCanvas| {
            c.display_list()
                .iter()
                .filter(|d| matches!(d, DrawCmd::GridLine { .. }))
                .count()
        };
        let at_one = lines(&canvas);
        canvas.viewport_mut().set_zoom(2.0);
        assert!(lines(&canvas) < at_one);
        canvas.viewport_mut().set_zoom(0.1);
        assert_eq!(lines(&canvas), 0);
    }
}
