//! # Errors
//!
//! Error types for the few fallible edges of the crate: loading a block registry
//! and loading an engine configuration. Everything inside the streaming and
//! meshing core degrades to defined fallbacks instead of failing.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::block::BlockId;

/// Failure while building a [`BlockRegistry`](crate::BlockRegistry) from JSON.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read block registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed block registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("block id 0 is reserved for air and cannot be redefined (got {0:?})")]
    ReservedAirId(String),

    #[error("duplicate block id: {0}")]
    DuplicateId(BlockId),

    #[error("duplicate block name: {0}")]
    DuplicateName(String),
}

/// Failure while loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error returned by the headless driver.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid frame count {0:?}")]
    InvalidFrameCount(String),
}
