// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undoable graph commands.
//!
//! Commands only go through [`PatchGraph`] mutation methods, so everything
//! they do is announced on the engine's event channel exactly like a direct
//! API call.

use scenepatch_graph::{Connection, ConnectionId, GraphError, NodeId, ObjectId, PatchGraph, SerializedNode};
use std::any::Any;
use std::fmt::Debug;
use thiserror::Error;

/// Command errors
#[derive(Debug, Error)]
pub enum CommandError {
    /// The engine rejected the mutation
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// An undoable mutation of a patch graph
pub trait GraphCommand: Debug + Send {
    /// Human-readable description
    fn description(&self) -> &str;

    /// Apply the command. Called again on redo.
    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError>;

    /// Revert what the last `execute` did
    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError>;

    /// Fold an already executed follow-up command into this one.
    ///
    /// Returns `true` when `next` was absorbed and needs no entry of its own.
    fn update(&mut self, next: &dyn GraphCommand) -> bool {
        let _ = next;
        false
    }

    /// Downcasting support for [`GraphCommand::update`]
    fn as_any(&self) -> &dyn Any;
}

/// Create a node with a reserved id
#[derive(Debug)]
pub struct AddNodeCommand {
    description: String,
    node: NodeId,
    node_type: String,
    position: [f32; 2],
    object: Option<ObjectId>,
    /// State captured on undo so redo brings back edited properties too
    snapshot: Option<SerializedNode>,
}

impl AddNodeCommand {
    /// Create a new add node command
    pub fn new(node: NodeId, node_type: impl Into<String>, position: [f32; 2], object: Option<ObjectId>) -> Self {
        let node_type = node_type.into();
        Self {
            description: format!("Add {node_type}"),
            node,
            node_type,
            position,
            object,
            snapshot: None,
        }
    }

    /// Id the node is created with
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl GraphCommand for AddNodeCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        match &self.snapshot {
            Some(snapshot) => graph.restore_node(snapshot)?,
            None => graph.create_node_with_id(self.node, &self.node_type, self.position, self.object)?,
        };
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        let node = graph.remove_node(self.node)?;
        self.snapshot = Some(node.serialize());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove a node together with its connections
#[derive(Debug)]
pub struct RemoveNodeCommand {
    description: String,
    node: NodeId,
    snapshot: Option<SerializedNode>,
    connections: Vec<Connection>,
}

impl RemoveNodeCommand {
    /// Create a new remove node command
    pub fn new(node: NodeId) -> Self {
        Self {
            description: "Remove node".to_string(),
            node,
            snapshot: None,
            connections: Vec::new(),
        }
    }
}

impl GraphCommand for RemoveNodeCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        let node = graph
            .node(self.node)
            .ok_or(CommandError::NodeNotFound(self.node))?;
        let snapshot = node.serialize();
        self.description = format!("Remove {}", snapshot.name);
        self.snapshot = Some(snapshot);
        self.connections = graph.connections_for_node(self.node).cloned().collect();

        graph.remove_node(self.node)?;
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        let snapshot = self.snapshot.as_ref().ok_or_else(|| {
            CommandError::InvalidOperation("node was never removed".to_string())
        })?;
        graph.restore_node(snapshot)?;

        for connection in &self.connections {
            // The other endpoint may be restored later by its own command
            if !graph.contains_node(connection.from_node) || !graph.contains_node(connection.to_node) {
                tracing::debug!(connection = %connection.id(), "connection endpoint not restored yet");
                continue;
            }
            graph.add_connection(
                connection.from_node,
                connection.from_output,
                connection.to_node,
                connection.to_input,
            )?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Move a node; consecutive moves of the same node coalesce
#[derive(Debug)]
pub struct MoveNodeCommand {
    node: NodeId,
    from: [f32; 2],
    to: [f32; 2],
}

impl MoveNodeCommand {
    /// Create a new move node command
    pub fn new(node: NodeId, from: [f32; 2], to: [f32; 2]) -> Self {
        Self { node, from, to }
    }

    /// Position before the move
    pub fn from(&self) -> [f32; 2] {
        self.from
    }

    /// Position after the move
    pub fn to(&self) -> [f32; 2] {
        self.to
    }
}

impl GraphCommand for MoveNodeCommand {
    fn description(&self) -> &str {
        "Move node"
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        graph.move_node(self.node, self.to)?;
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        graph.move_node(self.node, self.from)?;
        Ok(())
    }

    fn update(&mut self, next: &dyn GraphCommand) -> bool {
        match next.as_any().downcast_ref::<MoveNodeCommand>() {
            Some(next) if next.node == self.node => {
                self.to = next.to;
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Connect an output to an input
#[derive(Debug)]
pub struct AddConnectionCommand {
    connection: Connection,
    /// False when the connection already existed before execute
    created: bool,
}

impl AddConnectionCommand {
    /// Create a new add connection command
    pub fn new(from_node: NodeId, from_output: usize, to_node: NodeId, to_input: usize) -> Self {
        Self {
            connection: Connection::new(from_node, from_output, to_node, to_input),
            created: false,
        }
    }

    /// Id of the connection this command creates
    pub fn connection(&self) -> ConnectionId {
        self.connection.id()
    }
}

impl GraphCommand for AddConnectionCommand {
    fn description(&self) -> &str {
        "Connect"
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        let c = &self.connection;
        let existed = graph.connection(c.id()).is_some();
        graph.add_connection(c.from_node, c.from_output, c.to_node, c.to_input)?;
        self.created = !existed;
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        if self.created {
            graph.remove_connection(self.connection.id())?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove a connection
#[derive(Debug)]
pub struct RemoveConnectionCommand {
    connection: ConnectionId,
}

impl RemoveConnectionCommand {
    /// Create a new remove connection command
    pub fn new(connection: ConnectionId) -> Self {
        Self { connection }
    }
}

impl GraphCommand for RemoveConnectionCommand {
    fn description(&self) -> &str {
        "Disconnect"
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        graph.remove_connection(self.connection)?;
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        let c = self.connection;
        graph.add_connection(c.from_node, c.from_output, c.to_node, c.to_input)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Several commands undone and redone as one step
#[derive(Debug)]
pub struct BatchCommand {
    description: String,
    commands: Vec<Box<dyn GraphCommand>>,
}

impl BatchCommand {
    /// Create a new batch command
    pub fn new(description: impl Into<String>, commands: Vec<Box<dyn GraphCommand>>) -> Self {
        Self {
            description: description.into(),
            commands,
        }
    }

    /// Number of commands in the batch
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch holds no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl GraphCommand for BatchCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        for index in 0..self.commands.len() {
            if let Err(err) = self.commands[index].execute(graph) {
                // Leave the graph as it was before the batch
                for done in self.commands[..index].iter_mut().rev() {
                    if let Err(undo_err) = done.undo(graph) {
                        tracing::warn!(error = %undo_err, "failed to roll back batch");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self, graph: &mut PatchGraph) -> Result<(), CommandError> {
        for command in self.commands.iter_mut().rev() {
            command.undo(graph)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
