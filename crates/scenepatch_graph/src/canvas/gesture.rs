// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gesture state machine.
//!
//! At most one gesture is active: dragging a node, panning, or drawing a
//! connection. Each gesture ends on pointer release or when the pointer
//! leaves the canvas.

use super::{HitTarget, PatchCanvas};
use crate::connection::ConnectionId;
use crate::node::NodeId;
use egui::{Modifiers, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Active pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture
    #[default]
    Idle,
    /// Moving a node
    DraggingNode {
        /// Dragged node
        node: NodeId,
        /// Last pointer position (screen)
        last: Pos2,
        /// Whether any movement happened
        moved: bool,
    },
    /// Panning the view
    Panning {
        /// Last pointer position (screen)
        last: Pos2,
    },
    /// Dragging a new connection out of an output socket
    DrawingConnection {
        /// Source node
        from_node: NodeId,
        /// Source output index
        from_output: usize,
        /// Current pointer position (screen)
        cursor: Pos2,
    },
}

/// Raw pointer input, in canvas screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed
    Down {
        /// Pointer position
        position: Pos2,
        /// Extend the selection instead of replacing it
        additive: bool,
    },
    /// Pointer moved
    Move {
        /// Pointer position
        position: Pos2,
    },
    /// Primary button released
    Up {
        /// Pointer position
        position: Pos2,
    },
    /// Pointer left the canvas
    Leave,
}

/// Mouse wheel input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Pointer position (screen)
    pub position: Pos2,
    /// Scroll delta
    pub delta: Vec2,
    /// Held modifier keys; ctrl/cmd zooms, shift pans horizontally
    pub modifiers: Modifiers,
}

/// Semantic events produced by the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    /// A node was clicked
    NodeClick {
        /// Clicked node
        node: NodeId,
    },
    /// A connection was clicked
    ConnectionClick {
        /// Clicked connection
        connection: ConnectionId,
    },
    /// A connection drag started from an output socket
    ConnectionStart {
        /// Source node
        node: NodeId,
        /// Source output
        output: usize,
    },
    /// A connection drag was released over a compatible input socket
    #[serde(rename_all = "camelCase")]
    ConnectionComplete {
        /// Source node
        from_node_id: NodeId,
        /// Source output index
        from_output_index: usize,
        /// Target node
        to_node_id: NodeId,
        /// Target input index
        to_input_index: usize,
    },
    /// A connection drag ended without a target
    ConnectionCancelled,
    /// A node was dragged by `delta` world units
    NodeDrag {
        /// Dragged node
        node: NodeId,
        /// Movement since the previous drag event
        delta: [f32; 2],
    },
    /// A node drag finished
    NodeDragEnd {
        /// Dragged node
        node: NodeId,
    },
    /// Empty space was clicked
    EmptySpaceClick,
    /// The user asked to delete the selection
    DeleteSelection {
        /// Selected nodes
        nodes: Vec<NodeId>,
        /// Selected connections
        connections: Vec<ConnectionId>,
    },
}

impl PatchCanvas {
    /// Feed one pointer event through the gesture state machine
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, additive } => {
                if !matches!(self.gesture, Gesture::Idle) {
                    // A release was missed; close the stale gesture first
                    self.finish_gesture(None);
                }
                self.pointer_down(position, additive);
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => self.finish_gesture(Some(position)),
            PointerEvent::Leave => self.finish_gesture(None),
        }
    }

    /// Zoom around the cursor (ctrl/cmd) or pan (plain, shift for horizontal)
    pub fn handle_wheel(&mut self, event: WheelEvent) {
        if event.modifiers.ctrl || event.modifiers.command {
            let factor = (1.0 + event.delta.y * self.config.zoom_speed).max(0.01);
            self.viewport.zoom_at(event.position, factor);
        } else if event.modifiers.shift {
            let amount = if event.delta.x != 0.0 {
                event.delta.x
            } else {
                event.delta.y
            };
            self.viewport
                .pan_by(Vec2::new(amount * self.config.wheel_pan_speed, 0.0));
        } else {
            self.viewport.pan_by(event.delta * self.config.wheel_pan_speed);
        }
    }

    fn pointer_down(&mut self, position: Pos2, additive: bool) {
        match self.hit(position) {
            HitTarget::OutputSocket { node, index } => {
                self.gesture = Gesture::DrawingConnection {
                    from_node: node,
                    from_output: index,
                    cursor: position,
                };
                self.push_event(CanvasEvent::ConnectionStart {
                    node,
                    output: index,
                });
            }
            HitTarget::InputSocket { node, .. } | HitTarget::NodeBody(node) => {
                self.selection.select_node(node, additive);
                self.gesture = Gesture::DraggingNode {
                    node,
                    last: position,
                    moved: false,
                };
                self.push_event(CanvasEvent::NodeClick { node });
            }
            HitTarget::Connection(connection) => {
                self.selection.select_connection(connection, additive);
                self.push_event(CanvasEvent::ConnectionClick { connection });
            }
            HitTarget::Empty => {
                self.selection.clear();
                self.gesture = Gesture::Panning { last: position };
                self.push_event(CanvasEvent::EmptySpaceClick);
            }
        }
    }

    fn pointer_move(&mut self, position: Pos2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::DraggingNode { node, last, moved } => {
                let delta = self.viewport.screen_to_world_delta(position - *last);
                *last = position;
                if delta != Vec2::ZERO {
                    *moved = true;
                    let node = *node;
                    self.push_event(CanvasEvent::NodeDrag {
                        node,
                        delta: [delta.x, delta.y],
                    });
                }
            }
            Gesture::Panning { last } => {
                let delta = position - *last;
                *last = position;
                self.viewport.pan_by(delta);
            }
            Gesture::DrawingConnection { cursor, .. } => *cursor = position,
        }
    }

    /// End the active gesture; `release` is `None` when the pointer was lost
    fn finish_gesture(&mut self, release: Option<Pos2>) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { .. } => {}
            Gesture::DraggingNode { node, moved, .. } => {
                if moved {
                    self.push_event(CanvasEvent::NodeDragEnd { node });
                }
            }
            Gesture::DrawingConnection {
                from_node,
                from_output,
                ..
            } => {
                let target = release.map(|p| self.hit(p));
                match target {
                    Some(HitTarget::InputSocket { node, index })
                        if self.accepts(from_node, from_output, node, index) =>
                    {
                        self.push_event(CanvasEvent::ConnectionComplete {
                            from_node_id: from_node,
                            from_output_index: from_output,
                            to_node_id: node,
                            to_input_index: index,
                        });
                    }
                    _ => self.push_event(CanvasEvent::ConnectionCancelled),
                }
            }
        }
    }

    /// Whether a drawn connection may end on `to_node.inputs[to_input]`
    fn accepts(&self, from_node: NodeId, from_output: usize, to_node: NodeId, to_input: usize) -> bool {
        if from_node == to_node {
            return false;
        }
        let source = self
            .nodes
            .get(&from_node)
            .and_then(|n| n.outputs.get(from_output));
        let target = self.nodes.get(&to_node).and_then(|n| n.inputs.get(to_input));
        match (source, target) {
            (Some(source), Some(target)) => source.port_type.can_connect_to(&target.port_type),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{NodeView, PortView};
    use crate::config::CanvasConfig;
    use crate::connection::Connection;
    use crate::port::PortType;

    fn port(name: &str, port_type: PortType) -> PortView {
        PortView {
            name: name.to_string(),
            port_type,
        }
    }

    /// Node 1 at (0,0) with a float output; node 2 at (400,0) with a float and a string input
    fn canvas() -> PatchCanvas {
        let mut canvas = PatchCanvas::new(CanvasConfig::default());
        canvas.nodes.insert(
            NodeId(1),
            NodeView {
                id: NodeId(1),
                title: "Time".to_string(),
                position: Pos2::new(0.0, 0.0),
                inputs: Vec::new(),
                outputs: vec![port("time", PortType::Float)],
                bound: false,
            },
        );
        canvas.nodes.insert(
            NodeId(2),
            NodeView {
                id: NodeId(2),
                title: "Sink".to_string(),
                position: Pos2::new(400.0, 0.0),
                inputs: vec![port("seconds", PortType::Float), port("label", PortType::String)],
                outputs: Vec::new(),
                bound: false,
            },
        );
        canvas
    }

    fn down(canvas: &mut PatchCanvas, x: f32, y: f32) {
        canvas.handle_pointer(PointerEvent::Down {
            position: Pos2::new(x, y),
            additive: false,
        });
    }

    #[test]
    fn test_socket_press_inside_node_starts_connection() {
        let mut canvas = canvas();
        // Output socket of node 1 is at (140, 35); press 2px inside the body
        down(&mut canvas, 138.0, 35.0);
        assert!(matches!(canvas.gesture(), Gesture::DrawingConnection { from_node: NodeId(1), .. }));
        assert_eq!(
            canvas.take_events(),
            vec![CanvasEvent::ConnectionStart {
                node: NodeId(1),
                output: 0,
            }]
        );
    }

    #[test]
    fn test_release_over_input_completes_connection() {
        let mut canvas = canvas();
        down(&mut canvas, 140.0, 35.0);
        canvas.handle_pointer(PointerEvent::Move {
            position: Pos2::new(300.0, 40.0),
        });
        canvas.handle_pointer(PointerEvent::Up {
            position: Pos2::new(401.0, 35.0),
        });
        let events = canvas.take_events();
        assert_eq!(
            events.last(),
            Some(&CanvasEvent::ConnectionComplete {
                from_node_id: NodeId(1),
                from_output_index: 0,
                to_node_id: NodeId(2),
                to_input_index: 0,
            })
        );
        assert_eq!(*canvas.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_release_elsewhere_or_on_incompatible_input_cancels() {
        let mut canvas = canvas();
        down(&mut canvas, 140.0, 35.0);
        canvas.handle_pointer(PointerEvent::Up {
            position: Pos2::new(250.0, 300.0),
        });
        assert_eq!(canvas.take_events().last(), Some(&CanvasEvent::ConnectionCancelled));

        // String input at row 1: (400, 57)
        down(&mut canvas, 140.0, 35.0);
        canvas.handle_pointer(PointerEvent::Up {
            position: Pos2::new(400.0, 57.0),
        });
        assert_eq!(canvas.take_events().last(), Some(&CanvasEvent::ConnectionCancelled));

        down(&mut canvas, 140.0, 35.0);
        canvas.handle_pointer(PointerEvent::Leave);
        assert_eq!(canvas.take_events().last(), Some(&CanvasEvent::ConnectionCancelled));
    }

    #[test]
    fn test_node_drag_emits_world_deltas() {
        let mut canvas = canvas();
        canvas.viewport_mut().set_zoom(2.0);
        // Node 1 body at zoom 2: screen (40, 20) -> world (20, 10)
        down(&mut canvas, 40.0, 20.0);
        canvas.handle_pointer(PointerEvent::Move {
            position: Pos2::new(60.0, 30.0),
        });
        canvas.handle_pointer(PointerEvent::Up {
            position: Pos2::new(60.0, 30.0),
        });
        assert_eq!(
            canvas.take_events(),
            vec![
                CanvasEvent::NodeClick { node: NodeId(1) },
                CanvasEvent::NodeDrag {
                    node: NodeId(1),
                    delta: [10.0, 5.0],
                },
                CanvasEvent::NodeDragEnd { node: NodeId(1) },
            ]
        );
        assert!(canvas.selection().contains_node(NodeId(1)));
    }

    #[test]
    fn test_empty_space_pans_and_clears_selection() {
        let mut canvas = canvas();
        canvas.selection.select_node(NodeId(2), false);
        down(&mut canvas, 250.0, 400.0);
        canvas.handle_pointer(PointerEvent::Move {
            position: Pos2::new(270.0, 390.0),
        });
        canvas.handle_pointer(PointerEvent::Up {
            position: Pos2::new(270.0, 390.0),
        });
        assert!(canvas.selection().is_empty());
        assert_eq!(canvas.viewport().pan(), Vec2::new(20.0, -10.0));
        assert_eq!(canvas.take_events(), vec![CanvasEvent::EmptySpaceClick]);
    }

    #[test]
    fn test_connection_click_selects_connection() {
        let mut canvas = canvas();
        let id = ConnectionId::new(NodeId(1), 0, NodeId(2), 0);
        canvas.connections.insert(id, Connection::from(id));
        canvas.selection.select_node(NodeId(1), false);

        down(&mut canvas, 270.0, 35.0);
        assert!(canvas.selection().contains_connection(id));
        assert!(!canvas.selection().contains_node(NodeId(1)));
        assert_eq!(canvas.take_events(), vec![CanvasEvent::ConnectionClick { connection: id }]);
    }

    #[test]
    fn test_wheel_zoom_and_pan() {
        let mut canvas = canvas();
        let zoom = WheelEvent {
            position: Pos2::new(100.0, 100.0),
            delta: Vec2::new(0.0, 500.0),
            modifiers: Modifiers::CTRL,
        };
        canvas.handle_wheel(zoom);
        assert_eq!(canvas.viewport().zoom(), 1.5);
        assert_eq!(canvas.viewport().screen_to_world(Pos2::new(100.0, 100.0)), Pos2::new(100.0, 100.0));

        let before = canvas.viewport().pan();
        canvas.handle_wheel(WheelEvent {
            position: Pos2::new(100.0, 100.0),
            delta: Vec2::new(0.0, 30.0),
            modifiers: Modifiers::SHIFT,
        });
        assert_eq!(canvas.viewport().pan(), before + Vec2::new(30.0, 0.0));
        assert_eq!(canvas.viewport().zoom(), 1.5);
    }
}
