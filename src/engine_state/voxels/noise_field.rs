//! # Noise Field
//!
//! Seeded 2D heightfield sampling for terrain generation.
//!
//! `NoiseField` wraps a Perlin sampler and sums octaves of it. `NoiseRegion` is a
//! rectangular buffer of curved samples covering the streaming window, and
//! `NoiseRegionCache` keeps the last region around so that it is only recomputed
//! when the window moves or changes size.
//!
//! Samples are always taken at world block coordinates, so a column's height never
//! depends on which region it was computed in.

use noise::{NoiseFn, Perlin};

use crate::engine_state::config::WorldConfig;

/// Exponent of the sign-preserving curve applied to layered noise.
pub const HEIGHT_CURVE_EXPONENT: f64 = 1.3;

/// Offset from the world seed for per-column detail such as trees, so it stays
/// independent of the terrain sampler seeded with the world seed itself.
pub const DETAIL_SEED_OFFSET: u32 = 4000;

const FNV_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Generator seed for one world column, derived from the world seed.
///
/// The detail seed and the column position are folded with FNV-1a, so the same
/// column of the same world always gets the same seed.
pub fn column_seed(seed: u32, x: i32, z: i32) -> u64 {
    let detail = seed.wrapping_add(DETAIL_SEED_OFFSET);
    [detail, x as u32, z as u32]
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}

/// Deterministic 2D scalar field.
pub struct NoiseField {
    perlin: Perlin,
    seed: u32,
}

/// Octave parameters for [`NoiseField::layered`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSettings {
    /// Number of octaves summed
    pub octaves: u32,
    /// Frequency of the first octave
    pub frequency: f64,
    /// Amplitude of the first octave
    pub amplitude: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Amplitude multiplier per octave
    pub persistence: f64,
}

impl NoiseSettings {
    /// Reads the octave parameters from a world configuration.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            octaves: config.noise_octaves,
            frequency: config.noise_frequency,
            amplitude: config.noise_amplitude,
            lacunarity: config.noise_lacunarity,
            persistence: config.noise_persistence,
        }
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl NoiseField {
    /// Creates a field for `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// Seed this field was created with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// One sample of the base noise.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        self.perlin.get([x, z])
    }

    /// Sum of `octaves` samples at geometrically increasing frequency.
    ///
    /// # Arguments
    /// * `x`, `z` - Sample position
    /// * `octaves` - Number of octaves
    /// * `frequency` - Frequency of the first octave
    /// * `amplitude` - Amplitude of the first octave
    /// * `lacunarity` - Frequency multiplier per octave
    /// * `persistence` - Amplitude multiplier per octave
    ///
    /// # Returns
    /// An unnormalised signed value
    #[allow(clippy::too_many_arguments)]
    pub fn layered(
        &self,
        x: f64,
        z: f64,
        octaves: u32,
        frequency: f64,
        amplitude: f64,
        lacunarity: f64,
        persistence: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut frequency = frequency;
        let mut amplitude = amplitude;
        for _ in 0..octaves {
            total += self.sample(x * frequency, z * frequency) * amplitude;
            frequency *= lacunarity;
            amplitude *= persistence;
        }
        total
    }

    /// Layered sample with `settings`, passed through [`curve`].
    pub fn terrain(&self, x: f64, z: f64, settings: &NoiseSettings) -> f64 {
        curve(self.layered(
            x,
            z,
            settings.octaves,
            settings.frequency,
            settings.amplitude,
            settings.lacunarity,
            settings.persistence,
        ))
    }
}

/// Sign-preserving power curve: flattens low values and sharpens peaks.
pub fn curve(value: f64) -> f64 {
    value.signum() * value.abs().powf(HEIGHT_CURVE_EXPONENT)
}

/// A `width × width` buffer of terrain samples starting at a world block origin.
///
/// Row-major in z: the sample for world column `(origin_x + i, origin_z + j)` is at
/// `j * width + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseRegion {
    width: usize,
    origin: (i32, i32),
    samples: Vec<f32>,
}

impl NoiseRegion {
    /// Samples every column of the region.
    pub fn compute(field: &NoiseField, settings: &NoiseSettings, width: usize, origin: (i32, i32)) -> Self {
        let mut samples = Vec::with_capacity(width * width);
        for j in 0..width {
            for i in 0..width {
                let x = (origin.0 + i as i32) as f64;
                let z = (origin.1 + j as i32) as f64;
                samples.push(field.terrain(x, z, settings) as f32);
            }
        }

        Self {
            width,
            origin,
            samples,
        }
    }

    /// Edge length in blocks.
    pub fn width(&self) -> usize {
        self.width
    }

    /// World block coordinate (x, z) of the first sample.
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// The raw sample buffer.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Offset of a world block column inside the region, if it is covered.
    pub fn offset_of(&self, world_x: i32, world_z: i32) -> Option<(usize, usize)> {
        let dx = world_x - self.origin.0;
        let dz = world_z - self.origin.1;
        let width = self.width as i32;
        ((0..width).contains(&dx) && (0..width).contains(&dz)).then_some((dx as usize, dz as usize))
    }
}

/// Keeps the most recent region and recomputes it only when its key changes.
#[derive(Debug, Default)]
pub struct NoiseRegionCache {
    region: Option<NoiseRegion>,
    recomputes: usize,
}

impl NoiseRegionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the region for `(width, origin)`, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        field: &NoiseField,
        settings: &NoiseSettings,
        width: usize,
        origin: (i32, i32),
    ) -> &NoiseRegion {
        let hit = self
            .region
            .as_ref()
            .is_some_and(|region| region.width == width && region.origin == origin);

        if !hit {
            log::debug!("Recomputing noise region {width}x{width} at {origin:?}");
            self.recomputes += 1;
            self.region = None;
        }

        self.region
            .get_or_insert_with(|| NoiseRegion::compute(field, settings, width, origin))
    }

    /// Number of times a region had to be computed.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    /// The cached region, if any.
    pub fn region(&self) -> Option<&NoiseRegion> {
        self.region.as_ref()
    }
}
