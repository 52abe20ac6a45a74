//! Tunable parameters of the terrain generator.
//!
//! The whole record is plain data: a debug or tuning layer may edit it freely,
//! after which the owner rebuilds the [`NoiseField`](super::NoiseField) from it
//! and reloads every resident chunk. Nothing here watches for changes.

use serde::{Deserialize, Serialize};

/// Configuration of one fractal noise layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerParams {
    /// Frequency of the first octave, in cycles per block
    pub frequency: f64,
    pub octaves: usize,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves
    pub gain: f64,
}

impl NoiseLayerParams {
    pub const fn new(frequency: f64, octaves: usize, lacunarity: f64, gain: f64) -> Self {
        Self {
            frequency,
            octaves,
            lacunarity,
            gain,
        }
    }
}

impl Default for NoiseLayerParams {
    fn default() -> Self {
        Self::new(0.01, 4, 2.0, 0.5)
    }
}

/// Absolute heights and noise cutoffs used to pick the surface blocks of a column.
///
/// Checked in this order, first match wins:
/// 1. below water level: sand
/// 2. within `beach_band` blocks above water: sand
/// 3. above `snow_line`, or above `alpine_line` with erosion below
///    `alpine_erosion`: snow over stone
/// 4. erosion below `stone_erosion` on land above `stone_continentalness`: bare stone
/// 5. otherwise grass over dirt
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceThresholds {
    pub beach_band: i32,
    pub snow_line: i32,
    pub alpine_line: i32,
    pub alpine_erosion: f64,
    pub stone_erosion: f64,
    pub stone_continentalness: f64,
}

impl Default for SurfaceThresholds {
    fn default() -> Self {
        Self {
            beach_band: 3,
            snow_line: 140,
            alpine_line: 120,
            alpine_erosion: 0.3,
            stone_erosion: 0.35,
            stone_continentalness: 0.55,
        }
    }
}

/// Which surface strategy fills columns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SurfaceKind {
    /// Noise-driven terrain classified by [`SurfaceThresholds`]
    Layered,
    /// Grass over dirt over stone at a fixed height everywhere
    Flat { height: i32 },
}

/// Every knob of the terrain generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// World seed; layer `n` is seeded with `seed + n`
    pub seed: u32,

    pub continentalness: NoiseLayerParams,
    pub erosion: NoiseLayerParams,
    pub peaks_valleys: NoiseLayerParams,
    /// Shared by the X and Z warp layers
    pub warp: NoiseLayerParams,
    pub detail: NoiseLayerParams,

    /// Maximum domain-warp displacement in blocks
    pub warp_strength: f64,

    /// Continentalness below which terrain is ocean floor
    pub ocean_threshold: f64,
    /// Width of the beach band above `ocean_threshold`, in continentalness units
    pub beach_width: f64,
    /// Exponent of the elevation curves; below 1 steepens terrain near the thresholds
    pub shaping_exponent: f64,
    pub ocean_depth: f64,
    pub beach_height: f64,
    pub land_height: f64,

    /// Erosion below which land starts to rise into mountains
    pub erosion_cutoff: f64,
    pub mountain_height: f64,
    pub hill_height: f64,
    pub detail_amplitude: f64,

    /// Columns within this many blocks of the origin are pushed toward land; 0 disables
    pub spawn_island_radius: f64,
    /// Continentalness floor at the origin while the spawn island is enabled
    pub spawn_continentalness: f64,

    /// Absolute height of sea level
    pub water_level: i32,
    pub thresholds: SurfaceThresholds,
    pub surface: SurfaceKind,
    /// Fill air between the terrain and sea level with water
    pub fill_water: bool,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            continentalness: NoiseLayerParams::new(0.0015, 5, 2.0, 0.5),
            erosion: NoiseLayerParams::new(0.0025, 4, 2.0, 0.5),
            peaks_valleys: NoiseLayerParams::new(0.006, 4, 2.0, 0.5),
            warp: NoiseLayerParams::new(0.004, 3, 2.0, 0.5),
            detail: NoiseLayerParams::new(0.05, 2, 2.0, 0.5),
            warp_strength: 40.0,
            ocean_threshold: 0.42,
            beach_width: 0.05,
            shaping_exponent: 0.75,
            ocean_depth: 28.0,
            beach_height: 3.0,
            land_height: 36.0,
            erosion_cutoff: 0.45,
            mountain_height: 90.0,
            hill_height: 10.0,
            detail_amplitude: 1.5,
            spawn_island_radius: 0.0,
            spawn_continentalness: 0.75,
            water_level: 63,
            thresholds: SurfaceThresholds::default(),
            surface: SurfaceKind::Layered,
            fill_water: false,
        }
    }
}
