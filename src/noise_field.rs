//! Fractal noise fields
//!
//! Produces dense 2D scalar fields in `[0, 1]` from layered Perlin noise. The field is a
//! pure function of `(width, height, settings, seed, offset)`: the seed only drives the
//! per-octave lattice offsets, so two calls with identical inputs are bit-identical no
//! matter which thread runs them.
//!
//! Pipeline, in fixed order:
//! 1. Octave accumulation (amplitude × persistence, frequency × lacunarity)
//! 2. Optional min/max normalization
//! 3. Optional flip (`1 - v`)
//! 4. Height offset + clamp to `[0, 1]`
//! 5. Optional radius-2 box blur, clipped at the edges

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::tilemap::Tilemap;

/// A generated noise field. Cells are in `[0, 1]`.
pub type NoiseField = Tilemap<f32>;

/// Octave lattice offsets are drawn from this closed range.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Box blur radius applied when `smooth` is set.
pub const SMOOTHING_RADIUS: usize = 2;

/// Noise basis used per octave
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseType {
    #[default]
    Perlin,
}

/// Parameters for one noise layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub noise_type: NoiseType,
    /// Number of octaves summed (1-10)
    pub octaves: u32,
    /// Base sampling scale (higher = more features per field)
    pub scale: f32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f32,
    /// Frequency multiplier per octave (1.0-5.0)
    pub lacunarity: f32,
    /// Remap the field's own min/max to [0, 1]
    pub normalize: bool,
    /// Box-blur the final field
    pub smooth: bool,
    /// Added to every cell before clamping (-1.0 to 1.0)
    pub height_offset: f32,
    /// Invert the field (`1 - v`)
    pub flip_values: bool,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            noise_type: NoiseType::Perlin,
            octaves: 4,
            scale: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
            normalize: true,
            smooth: true,
            height_offset: 0.0,
            flip_values: false,
        }
    }
}

impl NoiseSettings {
    /// Check every parameter against its documented range.
    ///
    /// `layer` is only used to label the error.
    pub fn validate(&self, layer: &str) -> Result<()> {
        let invalid = |reason: String| TerrainError::InvalidSettings {
            layer: layer.to_string(),
            reason,
        };

        if !(1..=10).contains(&self.octaves) {
            return Err(invalid(format!("octaves {} not in [1, 10]", self.octaves)));
        }
        if !(self.scale > 0.001 && self.scale <= 10.0) {
            return Err(invalid(format!("scale {} not in (0.001, 10]", self.scale)));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(invalid(format!("persistence {} not in [0, 1]", self.persistence)));
        }
        if !(1.0..=5.0).contains(&self.lacunarity) {
            return Err(invalid(format!("lacunarity {} not in [1, 5]", self.lacunarity)));
        }
        if !(-1.0..=1.0).contains(&self.height_offset) {
            return Err(invalid(format!("height offset {} not in [-1, 1]", self.height_offset)));
        }
        Ok(())
    }
}

/// Derive the per-octave lattice offsets for a seed.
///
/// Components are consumed x then y for each octave in turn; changing that order
/// changes every field generated from the seed.
pub fn octave_offsets(octaves: u32, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..octaves)
        .map(|_| {
            let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..=OCTAVE_OFFSET_RANGE);
            let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..=OCTAVE_OFFSET_RANGE);
            (ox as f64, oy as f64)
        })
        .collect()
}

/// Shared per-call sampling state.
struct Sampler<'a> {
    settings: &'a NoiseSettings,
    basis: Perlin,
    offsets: Vec<(f64, f64)>,
    half_width: f64,
    half_height: f64,
    offset_x: f64,
    offset_y: f64,
}

impl<'a> Sampler<'a> {
    fn new(width: usize, height: usize, settings: &'a NoiseSettings, seed: u64, offset_x: i64, offset_y: i64) -> Self {
        Self {
            settings,
            basis: Perlin::new(seed as u32),
            offsets: octave_offsets(settings.octaves, seed),
            half_width: width as f64 / 2.0,
            half_height: height as f64 / 2.0,
            offset_x: offset_x as f64,
            offset_y: offset_y as f64,
        }
    }

    /// Raw (pre-normalization) fractal sum at a cell.
    fn sample(&self, x: usize, y: usize) -> f32 {
        let scale = self.settings.scale as f64;
        let persistence = self.settings.persistence as f64;
        let lacunarity = self.settings.lacunarity as f64;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;

        for &(ox, oy) in &self.offsets {
            let sx = ((x as f64 + self.offset_x) / self.half_width) * scale * frequency + ox;
            let sy = ((y as f64 + self.offset_y) / self.half_height) * scale * frequency + oy;

            let value = match self.settings.noise_type {
                NoiseType::Perlin => perlin01(&self.basis, sx, sy),
            };
            total += value * amplitude;

            frequency *= lacunarity;
            amplitude *= persistence;
        }

        total as f32
    }
}

/// Perlin noise remapped from [-1, 1] to [0, 1].
#[inline]
fn perlin01(basis: &Perlin, x: f64, y: f64) -> f64 {
    ((basis.get([x, y]) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Generate a noise field.
///
/// `offset_x`/`offset_y` shift the sampled window in cells, so adjacent windows of the
/// same size line up (regions pass `region * REGION_SIZE`).
pub fn generate(
    width: usize,
    height: usize,
    settings: &NoiseSettings,
    seed: u64,
    offset_x: i64,
    offset_y: i64,
) -> NoiseField {
    let sampler = Sampler::new(width, height, settings, seed, offset_x, offset_y);
    let mut field = Tilemap::new_with(width, height, 0.0f32);

    for (x, y, cell) in field.iter_mut() {
        *cell = sampler.sample(x, y);
    }

    post_process(field, settings)
}

/// Same output as [`generate`], with rows sampled on the current rayon pool.
pub fn generate_parallel(
    width: usize,
    height: usize,
    settings: &NoiseSettings,
    seed: u64,
    offset_x: i64,
    offset_y: i64,
) -> NoiseField {
    let sampler = Sampler::new(width, height, settings, seed, offset_x, offset_y);
    let mut field = Tilemap::new_with(width, height, 0.0f32);

    if width > 0 {
        field
            .rows_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = sampler.sample(x, y);
                }
            });
    }

    post_process(field, settings)
}

fn post_process(mut field: NoiseField, settings: &NoiseSettings) -> NoiseField {
    let Some((min, max)) = field.min_max() else {
        return field;
    };

    if settings.normalize {
        normalize(&mut field, min, max);
    }

    if settings.flip_values {
        for (_, _, v) in field.iter_mut() {
            *v = 1.0 - *v;
        }
    }

    // Offset is applied unconditionally so the clamp also covers un-normalized sums.
    for (_, _, v) in field.iter_mut() {
        *v = (*v + settings.height_offset).clamp(0.0, 1.0);
    }

    if settings.smooth {
        field = box_blur(&field, SMOOTHING_RADIUS);
    }

    field
}

/// Linear remap from `[min, max]` to `[0, 1]`. A flat field becomes all zeros.
fn normalize(field: &mut NoiseField, min: f32, max: f32) {
    let range = max - min;
    if range <= 0.0 {
        field.fill(0.0);
        return;
    }
    for (_, _, v) in field.iter_mut() {
        *v = (*v - min) / range;
    }
}

/// Mean over the `(2r+1)²` neighbourhood of each cell. Neighbours outside the field are
/// skipped, so edge cells average fewer samples.
pub fn box_blur(field: &NoiseField, radius: usize) -> NoiseField {
    let (width, height) = field.dimensions();
    let mut out = Tilemap::new_with(width, height, 0.0f32);
    let r = radius as i64;

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            let mut count = 0u32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if let Some(&v) = field.try_get(x as i64 + dx, y as i64 + dy) {
                        sum += v;
                        count += 1;
                    }
                }
            }
            out.set(x, y, sum / count as f32);
        }
    }

    out
}
