// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph documents on disk.
//!
//! The format follows the file extension: `.json` for interchange with the
//! host, `.ron` for project files.

use scenepatch_graph::{GraphDocument, SerializationError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// On-disk document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON
    Json,
    /// RON
    Ron,
}

impl DocumentFormat {
    /// Pick the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("ron") {
            Some(Self::Ron)
        } else {
            None
        }
    }
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encode or decode failure
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Extension is neither `.json` nor `.ron`
    #[error("Unsupported graph file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),
}

fn format_of(path: &Path) -> Result<DocumentFormat, PersistenceError> {
    DocumentFormat::from_path(path).ok_or_else(|| PersistenceError::UnsupportedExtension(path.to_path_buf()))
}

/// Write a document
pub fn save_document(path: &Path, document: &GraphDocument) -> Result<(), PersistenceError> {
    let content = match format_of(path)? {
        DocumentFormat::Json => document.to_json()?,
        DocumentFormat::Ron => document.to_ron()?,
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), nodes = document.nodes.len(), "graph saved");
    Ok(())
}

/// Read a document
pub fn load_document(path: &Path) -> Result<GraphDocument, PersistenceError> {
    let format = format_of(path)?;
    let content = std::fs::read_to_string(path)?;
    let document = match format {
        DocumentFormat::Json => GraphDocument::from_json(&content)?,
        DocumentFormat::Ron => GraphDocument::from_ron(&content)?,
    };
    tracing::info!(path = %path.display(), nodes = document.nodes.len(), "graph loaded");
    Ok(document)
}
