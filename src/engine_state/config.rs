//! # Engine Configuration
//!
//! Tunables for streaming, meshing and terrain, loadable from JSON. Every field
//! has a default, so a config file only needs to name what it changes:
//!
//! ```json
//! {
//!     "streaming": { "render_distance": 6, "scheduling": "Inline" },
//!     "meshing": { "ambient_occlusion": true },
//!     "terrain": { "seed": 42 }
//! }
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::rendering::meshing::MeshingOptions;
use super::voxels::generation::TerrainParams;
use crate::error::ConfigError;

/// Where generation and meshing run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingMode {
    /// On the calling thread inside `update`, under per-frame budgets
    Inline,
    /// On dedicated generation and meshing worker pools
    #[default]
    Threaded,
}

/// Residency and scheduling settings of the chunk manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks within this Chebyshev distance of the viewer's chunk are loaded
    pub render_distance: i32,
    /// Extra distance beyond `render_distance` before a chunk is evicted
    pub unload_margin: i32,
    pub scheduling: SchedulingMode,
    /// Generation threads; 0 derives the count from the hardware
    pub generation_workers: usize,
    /// Meshing threads; 0 derives the count from the hardware
    pub meshing_workers: usize,
    /// Inline mode: generations per `update`
    pub max_generations_per_frame: usize,
    /// Inline mode: meshings per `update`
    pub max_meshes_per_frame: usize,
    /// GPU uploads per `update`, in both modes
    pub max_uploads_per_frame: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: 12,
            unload_margin: 2,
            scheduling: SchedulingMode::Threaded,
            generation_workers: 0,
            meshing_workers: 0,
            max_generations_per_frame: 4,
            max_meshes_per_frame: 8,
            max_uploads_per_frame: 16,
        }
    }
}

impl StreamingConfig {
    /// Distance beyond which resident chunks are evicted.
    pub fn unload_distance(&self) -> i32 {
        self.render_distance.max(0) + self.unload_margin.max(0)
    }
}

/// Complete configuration of a chunk manager.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub streaming: StreamingConfig,
    pub meshing: MeshingOptions,
    pub terrain: TerrainParams,
}

impl EngineConfig {
    /// Parses a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.streaming.render_distance, 12);
        assert_eq!(config.streaming.unload_distance(), 14);
        assert_eq!(config.terrain.seed, 1337);
        assert!(!config.meshing.ambient_occlusion);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "streaming": { "render_distance": 3, "scheduling": "Inline" },
                 "terrain": { "seed": 7, "surface": { "kind": "Flat", "height": 10 } } }"#,
        )
        .unwrap();
        assert_eq!(config.streaming.render_distance, 3);
        assert_eq!(config.streaming.scheduling, SchedulingMode::Inline);
        assert_eq!(config.streaming.max_uploads_per_frame, 16);
        assert_eq!(config.terrain.seed, 7);
        assert_eq!(config.terrain.water_level, 63);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ \"streaming\": 5 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
