// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node and connection shapes shared by hit testing and drawing.

use super::{NodeView, Viewport};
use crate::config::CanvasConfig;
use crate::connection::Connection;
use crate::node::NodeId;
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexMap;

/// Horizontal space around a label
const LABEL_PADDING: f32 = 12.0;
/// Space below the last port row
const NODE_FOOTER: f32 = 8.0;
/// Polyline resolution of a connection curve
pub const CURVE_SEGMENTS: usize = 32;

/// World-space size of a node, wide enough for its title and port labels
pub fn node_size(config: &CanvasConfig, node: &NodeView) -> Vec2 {
    let title = label_chars(&node.title) * config.glyph_width + 2.0 * LABEL_PADDING;
    let inputs = widest_label(node.inputs.iter().map(|p| p.name.as_str()));
    let outputs = widest_label(node.outputs.iter().map(|p| p.name.as_str()));
    let ports = (inputs + outputs) * config.glyph_width + 4.0 * LABEL_PADDING;

    let rows = node.inputs.len().max(node.outputs.len()) as f32;
    Vec2::new(
        config.min_node_width.max(title).max(ports),
        config.header_height + rows * config.port_row_height + NODE_FOOTER,
    )
}

fn label_chars(label: &str) -> f32 {
    label.chars().count() as f32
}

fn widest_label<'a>(labels: impl Iterator<Item = &'a str>) -> f32 {
    labels.map(label_chars).fold(0.0, f32::max)
}

/// World-space rectangle of a node
pub fn node_rect(config: &CanvasConfig, node: &NodeView) -> Rect {
    Rect::from_min_size(node.position, node_size(config, node))
}

fn row_center(config: &CanvasConfig, node: &NodeView, index: usize) -> f32 {
    node.position.y
        + config.header_height
        + index as f32 * config.port_row_height
        + config.port_row_height / 2.0
}

/// World-space center of an input socket (left edge)
pub fn input_socket(config: &CanvasConfig, node: &NodeView, index: usize) -> Pos2 {
    Pos2::new(node.position.x, row_center(config, node, index))
}

/// World-space center of an output socket (right edge)
pub fn output_socket(config: &CanvasConfig, node: &NodeView, index: usize) -> Pos2 {
    let width = node_size(config, node).x;
    Pos2::new(node.position.x + width, row_center(config, node, index))
}

/// Control points of a left-to-right connection curve
pub fn connection_curve(from: Pos2, to: Pos2, curvature: f32) -> [Pos2; 4] {
    let distance = (to.x - from.x).abs();
    let curvature = curvature.min(distance * 0.5);
    [
        from,
        Pos2::new(from.x + curvature, from.y),
        Pos2::new(to.x - curvature, to.y),
        to,
    ]
}

/// Screen-space polyline of a connection, if both endpoints are on the canvas
pub fn connection_points(
    config: &CanvasConfig,
    viewport: &Viewport,
    nodes: &IndexMap<NodeId, NodeView>,
    connection: &Connection,
) -> Option<Vec<Pos2>> {
    let from = nodes.get(&connection.from_node)?;
    let to = nodes.get(&connection.to_node)?;
    let start = viewport.world_to_screen(output_socket(config, from, connection.from_output));
    let end = viewport.world_to_screen(input_socket(config, to, connection.to_input));
    let curve = connection_curve(start, end, config.bezier_curvature * viewport.zoom());
    Some(bezier_points(curve, CURVE_SEGMENTS))
}

/// Generate points along a cubic bezier curve
pub fn bezier_points(curve: [Pos2; 4], segments: usize) -> Vec<Pos2> {
    let [p0, p1, p2, p3] = curve;
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

/// Approximate distance from `point` to a curve sampled as a polyline
pub fn distance_to_polyline(point: Pos2, points: &[Pos2]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [single] => single.distance(point),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PortView;
    use crate::port::PortType;

    fn view(title: &str, inputs: &[&str], outputs: &[&str]) -> NodeView {
        let ports = |names: &[&str]| -> Vec<PortView> {
            names
                .iter()
                .map(|n| PortView {
                    name: n.to_string(),
                    port_type: PortType::Float,
                })
                .collect()
        };
        NodeView {
            id: NodeId(1),
            title: title.to_string(),
            position: Pos2::new(100.0, 50.0),
            inputs: ports(inputs),
            outputs: ports(outputs),
            bound: false,
        }
    }

    #[test]
    fn test_node_fits_labels() {
        let config = CanvasConfig::default();
        let small = view("Add", &["a", "b"], &["result"]);
        assert_eq!(node_size(&config, &small), Vec2::new(140.0, 24.0 + 2.0 * 22.0 + 8.0));

        let long = view("An Extremely Descriptive Node Title", &[], &[]);
        assert!(node_size(&config, &long).x > config.min_node_width);
    }

    #[test]
    fn test_socket_positions() {
        let config = CanvasConfig::default();
        let node = view("Add", &["a", "b"], &["result"]);
        assert_eq!(input_socket(&config, &node, 1), Pos2::new(100.0, 50.0 + 24.0 + 22.0 + 11.0));
        assert_eq!(output_socket(&config, &node, 0), Pos2::new(240.0, 50.0 + 24.0 + 11.0));
    }

    #[test]
    fn test_distance_to_curve() {
        let curve = connection_curve(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0), 50.0);
        let points = bezier_points(curve, CURVE_SEGMENTS);
        assert!(distance_to_polyline(Pos2::new(50.0, 3.0), &points) <= 3.0 + 1e-3);
        assert!(distance_to_polyline(Pos2::new(50.0, 30.0), &points) > 20.0);
    }
}
