//! # Surface Sampler
//!
//! Turns the relative terrain height of the [`NoiseField`] into an absolute column
//! height plus the three block types that make up the column: the top block, the
//! filler under it and the base everything else rests on.
//!
//! Block ids are resolved by name once, when the sampler is built. Missing blocks
//! never fail construction; they fall back to safe substitutes and log a warning:
//! - `Stone`: first opaque block of the registry, else air
//! - `Grass`, `Dirt`, `Sand`, `Snow`: stone
//! - `Water`: none (water filling is skipped)

use log::warn;

use super::noise_field::NoiseField;
use super::terrain_params::{SurfaceKind, TerrainParams};
use crate::engine_state::voxels::block::{BlockId, BlockRegistry, AIR};
use crate::engine_state::voxels::chunk::CHUNK_HEIGHT;

/// Description of one terrain column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceSample {
    /// Absolute y of the top block, in `[0, CHUNK_HEIGHT)`
    pub height: i32,
    pub top: BlockId,
    pub filler: BlockId,
    pub base: BlockId,
}

/// Block ids the sampler places, resolved against a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceBlocks {
    pub stone: BlockId,
    pub grass: BlockId,
    pub dirt: BlockId,
    pub sand: BlockId,
    pub snow: BlockId,
    pub water: Option<BlockId>,
}

impl SurfaceBlocks {
    /// Looks every surface block up by name, substituting fallbacks for missing ones.
    pub fn resolve(registry: &BlockRegistry) -> Self {
        let stone = registry.by_name("Stone").unwrap_or_else(|| {
            let fallback = registry.first_opaque().unwrap_or(AIR);
            warn!("Block registry has no Stone, using id {fallback} instead");
            fallback
        });
        let or_stone = |name: &str| {
            registry.by_name(name).unwrap_or_else(|| {
                warn!("Block registry has no {name}, using stone instead");
                stone
            })
        };

        let water = registry.by_name("Water");
        if water.is_none() {
            warn!("Block registry has no Water, oceans stay dry");
        }

        Self {
            stone,
            grass: or_stone("Grass"),
            dirt: or_stone("Dirt"),
            sand: or_stone("Sand"),
            snow: or_stone("Snow"),
            water,
        }
    }
}

/// Column sampler combining a [`NoiseField`] with a surface classification policy.
///
/// # Examples
///
/// ```
/// use voxel_world::{BlockRegistry, SurfaceSampler, TerrainParams};
///
/// let registry = BlockRegistry::with_defaults();
/// let sampler = SurfaceSampler::new(&TerrainParams::default(), &registry);
/// let column = sampler.sample_column(0, 0);
/// assert!((0..256).contains(&column.height));
/// assert_eq!(column, sampler.sample_column(0, 0));
/// ```
#[derive(Clone)]
pub struct SurfaceSampler {
    noise: NoiseField,
    blocks: SurfaceBlocks,
}

impl SurfaceSampler {
    /// Builds the noise field for `params` and resolves block ids against `registry`.
    pub fn new(params: &TerrainParams, registry: &BlockRegistry) -> Self {
        Self {
            noise: NoiseField::new(params),
            blocks: SurfaceBlocks::resolve(registry),
        }
    }

    /// Parameters the sampler was built from.
    pub fn params(&self) -> &TerrainParams {
        self.noise.params()
    }

    /// The underlying noise field.
    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Resolved block ids.
    pub fn blocks(&self) -> &SurfaceBlocks {
        &self.blocks
    }

    /// Absolute sea level.
    pub fn water_level(&self) -> i32 {
        self.params().water_level
    }

    /// Water block and the highest y to flood, when water filling is enabled.
    pub fn water_fill(&self) -> Option<(BlockId, i32)> {
        if !self.params().fill_water {
            return None;
        }
        self.blocks.water.map(|water| (water, self.water_level()))
    }

    /// Samples the column at world (x, z).
    pub fn sample_column(&self, world_x: i32, world_z: i32) -> SurfaceSample {
        match self.params().surface {
            SurfaceKind::Flat { height } => SurfaceSample {
                height: height.clamp(0, CHUNK_HEIGHT - 1),
                top: self.blocks.grass,
                filler: self.blocks.dirt,
                base: self.blocks.stone,
            },
            SurfaceKind::Layered => self.sample_layered(world_x, world_z),
        }
    }

    fn sample_layered(&self, world_x: i32, world_z: i32) -> SurfaceSample {
        let (x, z) = (world_x as f64, world_z as f64);
        let params = self.params();
        let water_level = params.water_level;

        let relative = self.noise.sample_terrain_height(x, z).round();
        let height = (water_level as f64 + relative).clamp(0.0, (CHUNK_HEIGHT - 1) as f64) as i32;

        let climate = self.noise.sample_climate(x, z);
        let thresholds = &params.thresholds;
        let blocks = &self.blocks;

        // Ocean floor and beach share sand.
        let (top, filler) = if height < water_level + thresholds.beach_band.max(0) {
            (blocks.sand, blocks.sand)
        } else if height > thresholds.snow_line
            || (height > thresholds.alpine_line && climate.erosion < thresholds.alpine_erosion)
        {
            (blocks.snow, blocks.stone)
        } else if climate.erosion < thresholds.stone_erosion
            && climate.continentalness > thresholds.stone_continentalness
        {
            (blocks.stone, blocks.stone)
        } else {
            (blocks.grass, blocks.dirt)
        };

        SurfaceSample {
            height,
            top,
            filler,
            base: blocks.stone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{BlockDefinition, UvRect};

    fn definition(id: BlockId, name: &str) -> BlockDefinition {
        BlockDefinition {
            id,
            name: name.to_string(),
            opaque: true,
            solid: true,
            face_uvs: [UvRect::default(); 6],
        }
    }

    #[test]
    fn missing_optional_blocks_fall_back() {
        let registry = BlockRegistry::from_definitions(vec![
            definition(1, "Stone"),
            definition(2, "Dirt"),
            definition(3, "Grass"),
            definition(4, "Sand"),
        ])
        .expect("valid registry");
        let blocks = SurfaceBlocks::resolve(&registry);
        assert_eq!(blocks.snow, 1);
        assert_eq!(blocks.water, None);
    }

    #[test]
    fn empty_registry_degrades_to_air() {
        let blocks = SurfaceBlocks::resolve(&BlockRegistry::empty());
        assert_eq!(blocks.stone, AIR);
        assert_eq!(blocks.grass, AIR);
    }

    #[test]
    fn heights_are_clamped_and_deterministic() {
        let registry = BlockRegistry::with_defaults();
        let params = TerrainParams {
            mountain_height: 10_000.0,
            ..TerrainParams::default()
        };
        let sampler = SurfaceSampler::new(&params, &registry);
        for i in -20..20 {
            let sample = sampler.sample_column(i * 97, i * -61);
            assert!((0..CHUNK_HEIGHT).contains(&sample.height));
            assert_eq!(sample, sampler.sample_column(i * 97, i * -61));
        }
    }

    #[test]
    fn classification_follows_height_bands() {
        let registry = BlockRegistry::with_defaults();
        let sampler = SurfaceSampler::new(&TerrainParams::default(), &registry);
        let blocks = *sampler.blocks();
        let water = sampler.water_level();
        for i in -64..64 {
            let sample = sampler.sample_column(i * 41, i * 23);
            assert_eq!(sample.base, blocks.stone);
            if sample.height < water + 3 {
                assert_eq!((sample.top, sample.filler), (blocks.sand, blocks.sand));
            } else {
                assert_ne!(sample.top, blocks.sand, "sand only below the beach line");
            }
        }
    }

    #[test]
    fn flat_surface_ignores_noise() {
        let registry = BlockRegistry::with_defaults();
        let params = TerrainParams {
            surface: SurfaceKind::Flat { height: 300 },
            ..TerrainParams::default()
        };
        let sampler = SurfaceSampler::new(&params, &registry);
        let sample = sampler.sample_column(-5, 999);
        assert_eq!(sample.height, CHUNK_HEIGHT - 1);
        assert_eq!(sample.top, sampler.blocks().grass);
        assert_eq!(sample.filler, sampler.blocks().dirt);
    }

    #[test]
    fn origin_column_is_deterministic_for_the_default_seed() {
        let registry = BlockRegistry::with_defaults();
        let params = TerrainParams::default();
        let first = SurfaceSampler::new(&params, &registry).sample_column(0, 0);
        let second = SurfaceSampler::new(&params, &registry).sample_column(0, 0);
        assert_eq!(first, second);
        assert!((0..CHUNK_HEIGHT).contains(&first.height));
    }
}
