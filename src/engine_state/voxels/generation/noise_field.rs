//! # Noise Field
//!
//! Deterministic scalar fields over world (x, z), built from independent fractal
//! Perlin layers.
//!
//! ## Layers
//!
//! | Layer           | Seed       | Sampled at    | Role                           |
//! |-----------------|------------|---------------|--------------------------------|
//! | continentalness | `seed + 0` | warped coords | ocean / beach / land shape     |
//! | erosion         | `seed + 1` | warped coords | ruggedness, mountain mask      |
//! | peaks/valleys   | `seed + 2` | warped coords | local height variation         |
//! | warp X          | `seed + 3` | raw coords    | domain-warp offset along X     |
//! | warp Z          | `seed + 4` | raw coords    | domain-warp offset along Z     |
//! | detail          | `seed + 5` | raw coords    | small symmetric perturbation   |
//!
//! Every layer returns values remapped from [-1, 1] to [0, 1].
//!
//! ## Height composition
//!
//! 1. warp the coordinates with [`NoiseField::warp`], the one routine shared by
//!    height and surface classification
//! 2. base elevation from continentalness: ocean, beach and land branches, each a
//!    power curve of the normalized distance from its threshold
//! 3. mountain factor: squared normalized distance below the erosion cutoff, land only
//! 4. peaks/valleys feed peak height weighted by the mountain factor and rolling
//!    hills weighted by its complement
//! 5. detail adds a small symmetric offset
//!
//! With `spawn_island_radius > 0` the climate continentalness near the origin is
//! raised toward `spawn_continentalness`, fading out linearly at the radius. It is
//! off by default, in which case the climate values are exactly the warped layer
//! samples.
//!
//! The field is immutable. Changing parameters means building a new one.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::terrain_params::{NoiseLayerParams, TerrainParams};

/// The named noise layers of a [`NoiseField`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NoiseLayer {
    Continentalness = 0,
    Erosion = 1,
    PeaksValleys = 2,
    WarpX = 3,
    WarpZ = 4,
    Detail = 5,
}

impl NoiseLayer {
    /// All layers in seed-offset order.
    pub fn all() -> [NoiseLayer; 6] {
        [
            NoiseLayer::Continentalness,
            NoiseLayer::Erosion,
            NoiseLayer::PeaksValleys,
            NoiseLayer::WarpX,
            NoiseLayer::WarpZ,
            NoiseLayer::Detail,
        ]
    }

    /// Offset added to the world seed for this layer.
    pub fn seed_offset(self) -> u32 {
        self as u32
    }
}

/// The warped climate values of one column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainClimate {
    pub continentalness: f64,
    pub erosion: f64,
    pub peaks_valleys: f64,
}

/// Multi-layer fractal noise sampler.
///
/// # Examples
///
/// ```
/// use voxel_world::{NoiseField, NoiseLayer, TerrainParams};
///
/// let field = NoiseField::new(&TerrainParams::default());
/// let value = field.sample_layer(NoiseLayer::Erosion, 12.5, -40.0);
/// assert!((0.0..=1.0).contains(&value));
/// assert_eq!(field.sample_terrain_height(3.0, 4.0), field.sample_terrain_height(3.0, 4.0));
/// ```
#[derive(Clone)]
pub struct NoiseField {
    params: TerrainParams,
    layers: [Fbm<Perlin>; 6],
}

fn build_layer(seed: u32, layer: NoiseLayer, params: &NoiseLayerParams) -> Fbm<Perlin> {
    Fbm::<Perlin>::new(seed.wrapping_add(layer.seed_offset()))
        .set_octaves(params.octaves.max(1))
        .set_frequency(params.frequency)
        .set_lacunarity(params.lacunarity)
        .set_persistence(params.gain)
}

fn shape(t: f64, exponent: f64) -> f64 {
    t.clamp(0.0, 1.0).powf(exponent)
}

impl NoiseField {
    /// Builds every layer generator from `params`.
    pub fn new(params: &TerrainParams) -> Self {
        let seed = params.seed;
        let layers = NoiseLayer::all().map(|layer| {
            let layer_params = match layer {
                NoiseLayer::Continentalness => &params.continentalness,
                NoiseLayer::Erosion => &params.erosion,
                NoiseLayer::PeaksValleys => &params.peaks_valleys,
                NoiseLayer::WarpX | NoiseLayer::WarpZ => &params.warp,
                NoiseLayer::Detail => &params.detail,
            };
            build_layer(seed, layer, layer_params)
        });

        Self {
            params: params.clone(),
            layers,
        }
    }

    /// Parameters this field was built from.
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Samples one layer at (x, z), remapped to [0, 1].
    pub fn sample_layer(&self, layer: NoiseLayer, x: f64, z: f64) -> f64 {
        let raw = self.layers[layer as usize].get([x, z]);
        if !raw.is_finite() {
            return 0.5;
        }
        ((raw.clamp(-1.0, 1.0) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Domain-warp displacement at raw (x, z), each component in
    /// `[-warp_strength, warp_strength]`.
    pub fn sample_domain_warp(&self, x: f64, z: f64) -> (f64, f64) {
        let strength = self.params.warp_strength;
        let dx = (self.sample_layer(NoiseLayer::WarpX, x, z) * 2.0 - 1.0) * strength;
        let dz = (self.sample_layer(NoiseLayer::WarpZ, x, z) * 2.0 - 1.0) * strength;
        (dx, dz)
    }

    /// Applies the domain warp to (x, z).
    pub fn warp(&self, x: f64, z: f64) -> (f64, f64) {
        let (dx, dz) = self.sample_domain_warp(x, z);
        (x + dx, z + dz)
    }

    /// Samples continentalness, erosion and peaks/valleys at the warped position
    /// of raw column (x, z).
    pub fn sample_climate(&self, x: f64, z: f64) -> TerrainClimate {
        let (wx, wz) = self.warp(x, z);
        let mut continentalness = self.sample_layer(NoiseLayer::Continentalness, wx, wz);

        let radius = self.params.spawn_island_radius;
        if radius > 0.0 {
            let falloff = (1.0 - (x * x + z * z).sqrt() / radius).clamp(0.0, 1.0);
            continentalness = continentalness.max(self.params.spawn_continentalness * falloff);
        }

        TerrainClimate {
            continentalness,
            erosion: self.sample_layer(NoiseLayer::Erosion, wx, wz),
            peaks_valleys: self.sample_layer(NoiseLayer::PeaksValleys, wx, wz),
        }
    }

    /// Terrain height relative to sea level at raw column (x, z).
    ///
    /// Negative values are below water. Never NaN: degenerate parameters collapse
    /// to 0.
    pub fn sample_terrain_height(&self, x: f64, z: f64) -> f64 {
        let climate = self.sample_climate(x, z);
        let detail = self.sample_layer(NoiseLayer::Detail, x, z);
        let height = self.compose_height(&climate, detail);
        if height.is_finite() {
            height
        } else {
            0.0
        }
    }

    fn compose_height(&self, climate: &TerrainClimate, detail: f64) -> f64 {
        let p = &self.params;
        let c = climate.continentalness;
        let land_start = p.ocean_threshold + p.beach_width;

        let base = if c < p.ocean_threshold {
            let t = (p.ocean_threshold - c) / p.ocean_threshold;
            -p.ocean_depth * shape(t, p.shaping_exponent)
        } else if c < land_start {
            let t = (c - p.ocean_threshold) / p.beach_width;
            p.beach_height * shape(t, p.shaping_exponent)
        } else {
            let t = (c - land_start) / (1.0 - land_start);
            p.beach_height + p.land_height * shape(t, p.shaping_exponent)
        };

        let mountain = if c >= land_start && climate.erosion < p.erosion_cutoff {
            let t = (p.erosion_cutoff - climate.erosion) / p.erosion_cutoff;
            t.clamp(0.0, 1.0).powi(2)
        } else {
            0.0
        };

        let pv = climate.peaks_valleys * 2.0 - 1.0;
        let peaks = mountain * p.mountain_height * pv;
        let hills = (1.0 - mountain) * p.hill_height * pv;
        let detail = (detail * 2.0 - 1.0) * p.detail_amplitude;

        base + peaks + hills + detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_stay_in_unit_range() {
        let field = NoiseField::new(&TerrainParams::default());
        for i in -50..50 {
            let (x, z) = (i as f64 * 37.3, i as f64 * -11.9);
            for layer in NoiseLayer::all() {
                let value = field.sample_layer(layer, x, z);
                assert!((0.0..=1.0).contains(&value), "{layer:?} = {value}");
            }
        }
    }

    #[test]
    fn same_seed_same_field() {
        let params = TerrainParams::default();
        let a = NoiseField::new(&params);
        let b = NoiseField::new(&params);
        for i in 0..64 {
            let (x, z) = (i as f64 * 13.0 - 400.0, i as f64 * 7.0 + 90.0);
            assert_eq!(
                a.sample_terrain_height(x, z).to_bits(),
                b.sample_terrain_height(x, z).to_bits()
            );
        }
    }

    #[test]
    fn layers_are_independent() {
        let field = NoiseField::new(&TerrainParams::default());
        let differs = (0..32).any(|i| {
            let x = i as f64 * 53.0 + 0.5;
            let z = i as f64 * 29.0 + 0.5;
            field.sample_layer(NoiseLayer::Continentalness, x, z)
                != field.sample_layer(NoiseLayer::Erosion, x, z)
        });
        assert!(differs, "distinct seeds should give distinct layers");
    }

    #[test]
    fn warp_is_bounded_by_strength() {
        let field = NoiseField::new(&TerrainParams::default());
        let strength = field.params().warp_strength;
        for i in 0..64 {
            let (dx, dz) = field.sample_domain_warp(i as f64 * 17.0, i as f64 * -5.0);
            assert!(dx.abs() <= strength && dz.abs() <= strength);
        }
    }

    #[test]
    fn climate_is_the_warped_layer_sample_by_default() {
        let field = NoiseField::new(&TerrainParams::default());
        for (x, z) in [(0.0, 0.0), (33.0, -71.0), (-512.5, 90.0)] {
            let (wx, wz) = field.warp(x, z);
            let climate = field.sample_climate(x, z);
            assert_eq!(
                climate.continentalness,
                field.sample_layer(NoiseLayer::Continentalness, wx, wz)
            );
            assert_eq!(climate.erosion, field.sample_layer(NoiseLayer::Erosion, wx, wz));
            assert_eq!(
                climate.peaks_valleys,
                field.sample_layer(NoiseLayer::PeaksValleys, wx, wz)
            );
        }
    }

    #[test]
    fn spawn_island_raises_the_origin_when_enabled() {
        let params = TerrainParams {
            spawn_island_radius: 192.0,
            ..TerrainParams::default()
        };
        let field = NoiseField::new(&params);
        let climate = field.sample_climate(0.0, 0.0);
        assert!(climate.continentalness >= params.spawn_continentalness);

        let far = field.sample_climate(400.0, 0.0);
        let (wx, wz) = field.warp(400.0, 0.0);
        assert_eq!(
            far.continentalness,
            field.sample_layer(NoiseLayer::Continentalness, wx, wz),
            "no effect past the radius"
        );
    }

    #[test]
    fn peaks_and_valleys_are_signed_on_mountains() {
        let field = NoiseField::new(&TerrainParams::default());
        let p = field.params();
        let climate = |peaks_valleys| TerrainClimate {
            continentalness: 1.0,
            erosion: 0.0,
            peaks_valleys,
        };
        let valley = field.compose_height(&climate(0.0), 0.5);
        let flat = field.compose_height(&climate(0.5), 0.5);
        let peak = field.compose_height(&climate(1.0), 0.5);

        assert!((flat - (p.beach_height + p.land_height)).abs() < 1e-9);
        assert!((peak - flat - p.mountain_height).abs() < 1e-9);
        assert!((flat - valley - p.mountain_height).abs() < 1e-9);
    }

    #[test]
    fn degenerate_params_do_not_produce_nan() {
        let params = TerrainParams {
            ocean_threshold: 0.0,
            beach_width: 0.0,
            erosion_cutoff: 0.0,
            ..TerrainParams::default()
        };
        let field = NoiseField::new(&params);
        for i in 0..32 {
            assert!(field.sample_terrain_height(i as f64 * 9.0, 3.0).is_finite());
        }
    }
}
