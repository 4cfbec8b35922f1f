// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ScenePatch` editor layer.
//!
//! Wraps the patch graph engine with undoable commands, a bounded history,
//! a controller that turns canvas gestures into commands, and graph files.

pub mod commands;
pub mod config;
pub mod controller;
pub mod history;
pub mod persistence;

pub use commands::{CommandError, GraphCommand};
pub use config::EditorConfig;
pub use controller::PatchEditor;
pub use history::{History, HistoryError};
pub use persistence::{load_document, save_document, PersistenceError};
