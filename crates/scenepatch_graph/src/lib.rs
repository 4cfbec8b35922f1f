// SPDX-License-Identifier: MIT OR Apache-2.0
//! Patch graph engine for `ScenePatch`.
//!
//! Users wire typed nodes together on a canvas; the graph both drives and
//! observes live properties of objects in a 3D scene.
//!
//! ## Architecture
//!
//! - [`node`], [`port`], [`connection`]: the data model
//! - [`registry`] and [`nodes`]: type tags mapped to node constructors
//! - [`scene`] and [`binding`]: scene objects with change subscriptions
//! - [`graph`]: the engine, with frame-driven and immediate evaluation
//! - [`serialization`]: graph documents (JSON and RON)
//! - [`canvas`]: viewport, hit testing, gestures and drawing

pub mod binding;
pub mod canvas;
pub mod config;
pub mod connection;
pub mod evaluation;
pub mod events;
pub mod graph;
pub mod layout;
pub mod node;
pub mod nodes;
pub mod port;
pub mod registry;
pub mod scene;
pub mod serialization;

pub use canvas::{CanvasEvent, PatchCanvas};
pub use config::{CanvasConfig, GraphConfig};
pub use connection::{Connection, ConnectionId};
pub use events::{GraphEvent, HostEvent};
pub use graph::{GraphError, PatchGraph, TickReport};
pub use node::{GraphNode, NodeData, NodeError, NodeId, SerializedNode};
pub use nodes::builtin_registry;
pub use port::{Port, PortDirection, PortType, PortValue};
pub use registry::{NodeRegistry, NodeTypeInfo};
pub use scene::{ObjectId, Scene, SceneObject, SharedScene};
pub use serialization::{GraphDocument, RestoreReport, SerializationError};
