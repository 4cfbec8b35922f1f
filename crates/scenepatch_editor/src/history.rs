// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of graph commands.
//!
//! Commands are executed through the history so that redo invalidation,
//! depth limits and gesture coalescing happen in one place. While a gesture
//! is open, a command that the previous entry of the same gesture can
//! [`update`](GraphCommand::update) from is folded into that entry.

use crate::commands::{CommandError, GraphCommand};
use scenepatch_graph::PatchGraph;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// The command failed while undoing or redoing
    #[error("Command failed: {0}")]
    Command(#[from] CommandError),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unique operation ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(u64);

impl OperationId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifies one open gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureId(u64);

#[derive(Debug)]
struct Entry {
    id: OperationId,
    gesture: Option<GestureId>,
    command: Box<dyn GraphCommand>,
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Entry>,
    redo_stack: VecDeque<Entry>,
    next_id: u64,
    max_depth: usize,
    gesture: Option<GestureId>,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
            gesture: None,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Open a gesture; updatable commands executed until
    /// [`end_gesture`](Self::end_gesture) collapse into one entry
    pub fn begin_gesture(&mut self) -> GestureId {
        let id = GestureId(self.next_id());
        self.gesture = Some(id);
        id
    }

    /// Close the open gesture
    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    /// Whether a gesture is open
    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Execute a command and record it.
    ///
    /// A failed command leaves the history untouched.
    pub fn execute(
        &mut self,
        mut command: Box<dyn GraphCommand>,
        graph: &mut PatchGraph,
    ) -> std::result::Result<OperationId, CommandError> {
        command.execute(graph)?;
        self.redo_stack.clear();

        if let (Some(gesture), Some(last)) = (self.gesture, self.undo_stack.back_mut()) {
            if last.gesture == Some(gesture) && last.command.update(&*command) {
                tracing::trace!(operation = last.id.value(), "coalesced into previous entry");
                return Ok(last.id);
            }
        }

        let id = OperationId(self.next_id());
        tracing::debug!(operation = id.value(), description = command.description(), "command executed");
        self.undo_stack.push_back(Entry {
            id,
            gesture: self.gesture,
            command,
        });

        // Enforce history limit
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }

        Ok(id)
    }

    /// Undo the last entry
    pub fn undo(&mut self, graph: &mut PatchGraph) -> Result<OperationId> {
        self.gesture = None;
        let mut entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;

        if let Err(err) = entry.command.undo(graph) {
            self.undo_stack.push_back(entry);
            return Err(err.into());
        }

        tracing::debug!(operation = entry.id.value(), description = entry.command.description(), "undo");
        let id = entry.id;
        entry.gesture = None;
        self.redo_stack.push_back(entry);
        Ok(id)
    }

    /// Redo the last undone entry
    pub fn redo(&mut self, graph: &mut PatchGraph) -> Result<OperationId> {
        self.gesture = None;
        let mut entry = self
            .redo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToRedo)?;

        if let Err(err) = entry.command.execute(graph) {
            self.redo_stack.push_back(entry);
            return Err(err.into());
        }

        tracing::debug!(operation = entry.id.value(), description = entry.command.description(), "redo");
        let id = entry.id;
        self.undo_stack.push_back(entry);
        Ok(id)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.gesture = None;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.command.description())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.command.description())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddNodeCommand, MoveNodeCommand};
    use scenepatch_graph::{builtin_registry, NodeId, Scene};

    fn graph() -> PatchGraph {
        PatchGraph::new(builtin_registry(), Scene::new().into_shared())
    }

    fn add(history: &mut History, graph: &mut PatchGraph) -> NodeId {
        let id = graph.next_node_id();
        history
            .execute(Box::new(AddNodeCommand::new(id, "number", [0.0, 0.0], None)), graph)
            .unwrap();
        id
    }

    fn position(graph: &PatchGraph, id: NodeId) -> [f32; 2] {
        graph.node(id).unwrap().data().position
    }

    #[test]
    fn test_undo_redo() {
        let mut graph = graph();
        let mut history = History::new();
        assert!(!history.can_undo());

        let id = add(&mut history, &mut graph);
        assert_eq!(history.undo_description(), Some("Add number"));

        history.undo(&mut graph).unwrap();
        assert!(!graph.contains_node(id));
        assert!(history.can_redo());

        history.redo(&mut graph).unwrap();
        assert!(graph.contains_node(id));
        assert!(matches!(history.redo(&mut graph), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut graph = graph();
        let mut history = History::new();
        add(&mut history, &mut graph);
        history.undo(&mut graph).unwrap();
        assert_eq!(history.redo_depth(), 1);

        add(&mut history, &mut graph);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_drag_gesture_is_one_step() {
        let mut graph = graph();
        let mut history = History::new();
        let id = add(&mut history, &mut graph);

        history.begin_gesture();
        let mut from = [0.0, 0.0];
        for step in 1..=5 {
            let to = [step as f32 * 10.0, 0.0];
            history
                .execute(Box::new(MoveNodeCommand::new(id, from, to)), &mut graph)
                .unwrap();
            from = to;
        }
        history.end_gesture();

        assert_eq!(history.undo_depth(), 2);
        assert_eq!(position(&graph, id), [50.0, 0.0]);

        history.undo(&mut graph).unwrap();
        assert_eq!(position(&graph, id), [0.0, 0.0]);
    }

    #[test]
    fn test_moves_outside_gesture_stay_separate() {
        let mut graph = graph();
        let mut history = History::new();
        let id = add(&mut history, &mut graph);

        for (from, to) in [([0.0, 0.0], [10.0, 0.0]), ([10.0, 0.0], [20.0, 0.0])] {
            history
                .execute(Box::new(MoveNodeCommand::new(id, from, to)), &mut graph)
                .unwrap();
        }
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn test_failed_command_not_recorded() {
        let mut graph = graph();
        let mut history = History::new();
        let result = history.execute(
            Box::new(MoveNodeCommand::new(NodeId(7), [0.0, 0.0], [1.0, 1.0])),
            &mut graph,
        );
        assert!(result.is_err());
        assert_eq!(history.stats(), HistoryStats {
            undo_count: 0,
            redo_count: 0,
            max_depth: MAX_HISTORY,
        });
    }

    #[test]
    fn test_depth_limit() {
        let mut graph = graph();
        let mut history = History::with_max_depth(3);
        for _ in 0..5 {
            add(&mut history, &mut graph);
        }
        assert_eq!(history.undo_depth(), 3);
    }
}
