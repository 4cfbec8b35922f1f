// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine and canvas settings.

use serde::{Deserialize, Serialize};

/// Placement settings used by the graph engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Horizontal gap between a new node and the group it is placed beside
    pub node_spacing: f32,
    /// Vertical step used when searching for a free slot
    pub row_spacing: f32,
    /// Two nodes closer than this on both axes count as overlapping
    pub overlap_tolerance: f32,
    /// Columns of the fallback grid layout
    pub grid_columns: usize,
    /// Footprint assumed for a node when placing it
    pub node_size: [f32; 2],
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_spacing: 80.0,
            row_spacing: 120.0,
            overlap_tolerance: 60.0,
            grid_columns: 4,
            node_size: [180.0, 100.0],
        }
    }
}

/// Viewport, hit-testing and drawing settings for the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Smallest zoom factor
    pub min_zoom: f32,
    /// Largest zoom factor
    pub max_zoom: f32,
    /// Zoom change per wheel unit
    pub zoom_speed: f32,
    /// Pan distance per wheel unit (screen pixels)
    pub wheel_pan_speed: f32,
    /// Socket hit radius (world units)
    pub socket_radius: f32,
    /// Smallest socket hit radius on screen, whatever the zoom (screen pixels)
    pub min_socket_hit_radius: f32,
    /// Maximum pointer distance to a connection curve (screen pixels)
    pub connection_tolerance: f32,
    /// Background grid spacing (world units)
    pub grid_spacing: f32,
    /// Minimum node width
    pub min_node_width: f32,
    /// Node header height
    pub header_height: f32,
    /// Height of one port row
    pub port_row_height: f32,
    /// Approximate label glyph width used to size nodes
    pub glyph_width: f32,
    /// Horizontal bezier handle length
    pub bezier_curvature: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 4.0,
            zoom_speed: 0.001,
            wheel_pan_speed: 1.0,
            socket_radius: 6.0,
            min_socket_hit_radius: 6.0,
            connection_tolerance: 6.0,
            grid_spacing: 20.0,
            min_node_width: 140.0,
            header_height: 24.0,
            port_row_height: 22.0,
            glyph_width: 7.0,
            bezier_curvature: 50.0,
        }
    }
}
