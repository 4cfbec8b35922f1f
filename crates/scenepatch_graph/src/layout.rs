// SPDX-License-Identifier: MIT OR Apache-2.0
//! Smart positioning of newly created nodes.
//!
//! Property-mirroring nodes are placed to the right of the plain nodes that
//! feed them; plain nodes go to the left of the property nodes they drive.
//! Without a directional bias, nodes fall back to a grid.

use crate::config::GraphConfig;

/// A node already on the canvas, as seen by the placer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNode {
    /// World position (top-left)
    pub position: [f32; 2],
    /// Whether the node mirrors a scene object property
    pub mirrors_property: bool,
}

/// Choose a position for a new node.
///
/// `viewport_center` is the world-space point at the center of the visible
/// canvas; an empty graph places the node centered on it.
pub fn smart_position(
    config: &GraphConfig,
    existing: &[PlacedNode],
    mirrors_property: bool,
    viewport_center: [f32; 2],
) -> [f32; 2] {
    let [width, height] = config.node_size;

    if existing.is_empty() {
        return [viewport_center[0] - width / 2.0, viewport_center[1] - height / 2.0];
    }

    // Property nodes sit right of non-property nodes and vice versa
    let reference: Vec<&PlacedNode> = existing
        .iter()
        .filter(|n| n.mirrors_property != mirrors_property)
        .collect();

    if !reference.is_empty() {
        let top = reference
            .iter()
            .map(|n| n.position[1])
            .fold(f32::INFINITY, f32::min);
        let x = if mirrors_property {
            let right = reference
                .iter()
                .map(|n| n.position[0])
                .fold(f32::NEG_INFINITY, f32::max);
            right + width + config.node_spacing
        } else {
            let left = reference
                .iter()
                .map(|n| n.position[0])
                .fold(f32::INFINITY, f32::min);
            left - width - config.node_spacing
        };
        return [x, free_row(config, existing, x, top)];
    }

    grid_position(config, existing)
}

/// Deterministic grid slot anchored at the top-left of the existing nodes
fn grid_position(config: &GraphConfig, existing: &[PlacedNode]) -> [f32; 2] {
    let columns = config.grid_columns.max(1);
    let origin_x = existing
        .iter()
        .map(|n| n.position[0])
        .fold(f32::INFINITY, f32::min);
    let origin_y = existing
        .iter()
        .map(|n| n.position[1])
        .fold(f32::INFINITY, f32::min);
    let step_x = config.node_size[0] + config.node_spacing;

    let mut index = existing.len();
    // Bounded: each existing node occupies at most one slot
    for _ in 0..=existing.len() {
        let column = (index % columns) as f32;
        let row = (index / columns) as f32;
        let candidate = [origin_x + column * step_x, origin_y + row * config.row_spacing];
        if !overlaps(config, existing, candidate) {
            return candidate;
        }
        index += 1;
    }

    let column = (index % columns) as f32;
    let row = (index / columns) as f32;
    [origin_x + column * step_x, origin_y + row * config.row_spacing]
}

/// First row at or below `top` where column `x` is free
fn free_row(config: &GraphConfig, existing: &[PlacedNode], x: f32, top: f32) -> f32 {
    let mut y = top;
    for _ in 0..=existing.len() * 2 {
        if !overlaps(config, existing, [x, y]) {
            break;
        }
        y += config.row_spacing;
    }
    y
}

fn overlaps(config: &GraphConfig, existing: &[PlacedNode], candidate: [f32; 2]) -> bool {
    existing.iter().any(|n| {
        (n.position[0] - candidate[0]).abs() < config.overlap_tolerance
            && (n.position[1] - candidate[1]).abs() < config.overlap_tolerance
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(x: f32, y: f32) -> PlacedNode {
        PlacedNode {
            position: [x, y],
            mirrors_property: false,
        }
    }

    fn property(x: f32, y: f32) -> PlacedNode {
        PlacedNode {
            position: [x, y],
            mirrors_property: true,
        }
    }

    #[test]
    fn test_empty_graph_centers_in_viewport() {
        let config = GraphConfig::default();
        let pos = smart_position(&config, &[], false, [400.0, 300.0]);
        assert_eq!(pos, [310.0, 250.0]);
    }

    #[test]
    fn test_property_node_goes_right_of_plain_nodes() {
        let config = GraphConfig::default();
        let existing = [plain(0.0, 0.0), plain(100.0, 200.0)];
        let pos = smart_position(&config, &existing, true, [0.0, 0.0]);
        assert_eq!(pos[0], 100.0 + 180.0 + 80.0);
        assert_eq!(pos[1], 0.0);
    }

    #[test]
    fn test_plain_node_goes_left_and_avoids_overlap() {
        let config = GraphConfig::default();
        let existing = [property(500.0, 0.0), plain(240.0, 0.0)];
        let pos = smart_position(&config, &existing, false, [0.0, 0.0]);
        assert_eq!(pos[0], 500.0 - 180.0 - 80.0);
        // Slot at y=0 is taken by the plain node at x=240
        assert_eq!(pos[1], 120.0);
    }

    #[test]
    fn test_grid_fallback_without_bias() {
        let config = GraphConfig::default();
        let existing = [plain(0.0, 0.0)];
        let pos = smart_position(&config, &existing, false, [999.0, 999.0]);
        assert_eq!(pos, [260.0, 0.0]);
    }
}
