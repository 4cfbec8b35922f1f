// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings file.

use scenepatch_graph::{CanvasConfig, GraphConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::history::MAX_HISTORY;

/// Current settings format version
pub const EDITOR_CONFIG_VERSION: u32 = 1;

/// Settings for the engine, the canvas and the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version
    pub version: u32,
    /// Engine placement settings
    pub graph: GraphConfig,
    /// Canvas settings
    pub canvas: CanvasConfig,
    /// Maximum undo depth
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: EDITOR_CONFIG_VERSION,
            graph: GraphConfig::default(),
            canvas: CanvasConfig::default(),
            history_depth: MAX_HISTORY,
        }
    }
}

impl EditorConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EditorConfig = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Version check
        if config.version > EDITOR_CONFIG_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    config.version, EDITOR_CONFIG_VERSION
                ),
            ));
        }

        Ok(config)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scenepatch_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_save_load_round_trip() {
        let path = temp_path("settings.ron");
        let mut config = EditorConfig::default();
        config.canvas.max_zoom = 8.0;
        config.history_depth = 20;

        config.save(&path).unwrap();
        let loaded = EditorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EditorConfig = ron::from_str("(history_depth: 5)").unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let path = temp_path("future.ron");
        let config = EditorConfig {
            version: EDITOR_CONFIG_VERSION + 1,
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        let err = EditorConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
