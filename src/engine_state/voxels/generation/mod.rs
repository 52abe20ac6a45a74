//! # Terrain Generation
//!
//! Procedural terrain built from coordinates and a seed only. Nothing here reads
//! or writes world history: the same parameters always reproduce the same terrain.
//!
//! - [`terrain_params`]: the tunable parameter record
//! - [`noise_field`]: fractal noise layers and the height function
//! - [`surface`]: column height and surface block classification

pub mod noise_field;
pub mod surface;
pub mod terrain_params;

pub use noise_field::{NoiseField, NoiseLayer, TerrainClimate};
pub use surface::{SurfaceBlocks, SurfaceSample, SurfaceSampler};
pub use terrain_params::{NoiseLayerParams, SurfaceKind, SurfaceThresholds, TerrainParams};
