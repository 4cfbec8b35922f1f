// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom transform between graph world space and canvas screen space.
//!
//! `screen = world * zoom + pan`. Screen coordinates are relative to the
//! canvas origin (top-left), not the window.

use egui::{Pos2, Vec2};

/// Canvas viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pan: Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Viewport {
    /// Identity viewport with the given zoom range
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    /// Current pan offset (screen pixels)
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the pan offset
    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = pan;
    }

    /// Set the zoom factor, clamped to the configured range
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Map a world position to the screen
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        Pos2::new(
            world.x * self.zoom + self.pan.x,
            world.y * self.zoom + self.pan.y,
        )
    }

    /// Map a screen position back to world space
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    /// Convert a screen-space distance to world units
    pub fn screen_to_world_delta(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Translate the view by a screen-space delta
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Rescale by `factor`, keeping the world point under `cursor` fixed
    pub fn zoom_at(&mut self, cursor: Pos2, factor: f32) {
        let anchor = self.screen_to_world(cursor);
        self.set_zoom(self.zoom * factor);
        self.pan = Vec2::new(
            cursor.x - anchor.x * self.zoom,
            cursor.y - anchor.y * self.zoom,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_round_trip_across_zoom_range() {
        let mut viewport = Viewport::new(0.1, 4.0);
        viewport.set_pan(Vec2::new(-37.5, 120.25));
        let world = Pos2::new(812.0, -44.5);
        for zoom in [0.1, 0.35, 1.0, 2.2, 4.0] {
            viewport.set_zoom(zoom);
            let screen = viewport.world_to_screen(world);
            assert!(close(viewport.screen_to_world(screen), world));
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::new(0.1, 4.0);
        viewport.set_zoom(50.0);
        assert_eq!(viewport.zoom(), 4.0);
        viewport.zoom_at(Pos2::ZERO, 0.0001);
        assert_eq!(viewport.zoom(), 0.1);
    }

    #[test]
    fn test_zoom_keeps_cursor_anchor() {
        let mut viewport = Viewport::new(0.1, 4.0);
        viewport.set_pan(Vec2::new(30.0, 10.0));
        let cursor = Pos2::new(200.0, 150.0);
        let before = viewport.screen_to_world(cursor);
        viewport.zoom_at(cursor, 1.5);
        assert!(close(viewport.screen_to_world(cursor), before));
        assert_eq!(viewport.zoom(), 1.5);
    }
}
