// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry mapping node type tags to constructors.
//!
//! The node set is closed: the registry is filled once at startup and every
//! node, whether created by the user, a command or a restore, goes through it.

use crate::node::{GraphNode, NodeCategory, NodeError, NodeId};
use crate::scene::ObjectId;
use indexmap::IndexMap;

/// Arguments handed to a node factory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSpawn {
    /// Id assigned by the engine
    pub id: NodeId,
    /// Canvas position
    pub position: [f32; 2],
    /// Scene object to mirror, resolved by the host
    pub object: Option<ObjectId>,
}

/// Constructor for one node type
pub type NodeFactory = Box<dyn Fn(NodeSpawn) -> Result<Box<dyn GraphNode>, NodeError> + Send + Sync>;

/// Node type definition
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeInfo {
    /// Unique type tag
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Whether instances mirror a scene object property
    pub mirrors_property: bool,
}

impl NodeTypeInfo {
    /// Describe a node type
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            mirrors_property: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the type as mirroring a scene object property
    pub fn mirroring_property(mut self) -> Self {
        self.mirrors_property = true;
        self
    }
}

/// Failure to construct a node
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No factory registered for the tag
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    /// The factory rejected its arguments
    #[error("Factory for '{node_type}' failed: {source}")]
    Factory {
        /// Type tag
        node_type: String,
        /// Underlying node error
        #[source]
        source: NodeError,
    },
}

struct RegistryEntry {
    info: NodeTypeInfo,
    factory: NodeFactory,
}

/// Registry of available node types
#[derive(Default)]
pub struct NodeRegistry {
    types: IndexMap<String, RegistryEntry>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any previous factory for the tag
    pub fn register<F>(&mut self, info: NodeTypeInfo, factory: F)
    where
        F: Fn(NodeSpawn) -> Result<Box<dyn GraphNode>, NodeError> + Send + Sync + 'static,
    {
        self.types.insert(
            info.id.clone(),
            RegistryEntry {
                info,
                factory: Box::new(factory),
            },
        );
    }

    /// Get a node type by tag
    pub fn get(&self, id: &str) -> Option<&NodeTypeInfo> {
        self.types.get(id).map(|e| &e.info)
    }

    /// Check whether a tag is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.values().map(|e| &e.info)
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types().filter(move |t| t.category == category)
    }

    /// Construct a node of the given type
    pub fn create(&self, type_id: &str, spawn: NodeSpawn) -> Result<Box<dyn GraphNode>, RegistryError> {
        let entry = self
            .types
            .get(type_id)
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_string()))?;
        (entry.factory)(spawn).map_err(|source| RegistryError::Factory {
            node_type: type_id.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::builtin_registry;

    fn spawn(id: u64) -> NodeSpawn {
        NodeSpawn {
            id: NodeId(id),
            position: [10.0, 20.0],
            object: None,
        }
    }

    #[test]
    fn test_create_known_type() {
        let registry = builtin_registry();
        let node = registry.create("add", spawn(3)).unwrap();
        assert_eq!(node.data().id, NodeId(3));
        assert_eq!(node.data().node_type, "add");
        assert_eq!(node.data().position, [10.0, 20.0]);
        assert_eq!(node.data().inputs.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let registry = builtin_registry();
        let err = registry.create("teleporter", spawn(1)).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownType(ref t) if t == "teleporter"));
    }

    #[test]
    fn test_categories() {
        let registry = builtin_registry();
        assert!(registry
            .types_in_category(NodeCategory::Scene)
            .all(|t| t.mirrors_property));
        assert!(registry.contains("time"));
    }
}
