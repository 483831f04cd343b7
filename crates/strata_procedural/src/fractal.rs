//! # Fractal Noise
//!
//! Sums Perlin noise over several octaves. Each octave doubles (by
//! `lacunarity`) the frequency and halves (by `persistence`) the weight of
//! the one before it; the total is averaged over the octave count so the
//! height stays roughly in `[0, 1]` however many octaves are stacked.

use std::sync::Arc;

use crate::error::{ProceduralError, ProceduralResult};
use crate::noise::{PerlinNoise, PermutationTable};

/// Validated octave parameters.
///
/// Construction rejects values that would divide by zero or iterate
/// nothing, so sampling never has to check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    scale: f64,
}

impl NoiseParams {
    /// Default octave count.
    pub const DEFAULT_OCTAVES: u32 = 6;
    /// Default amplitude decay per octave.
    pub const DEFAULT_PERSISTENCE: f64 = 0.5;
    /// Default frequency growth per octave.
    pub const DEFAULT_LACUNARITY: f64 = 2.0;
    /// Default world-units-per-noise-unit divisor.
    pub const DEFAULT_SCALE: f64 = 100.0;

    /// Creates validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `octaves` is zero,
    /// `scale` is not a positive finite number, or `persistence` /
    /// `lacunarity` are not finite.
    pub fn new(octaves: u32, persistence: f64, lacunarity: f64, scale: f64) -> ProceduralResult<Self> {
        if octaves < 1 {
            return Err(ProceduralError::invalid("octaves", "must be at least 1"));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ProceduralError::invalid(
                "scale",
                format!("must be a positive finite number, got {scale}"),
            ));
        }
        if !persistence.is_finite() {
            return Err(ProceduralError::invalid("persistence", "must be finite"));
        }
        if !lacunarity.is_finite() {
            return Err(ProceduralError::invalid("lacunarity", "must be finite"));
        }

        Ok(Self {
            octaves,
            persistence,
            lacunarity,
            scale,
        })
    }

    /// Number of octaves.
    #[inline]
    #[must_use]
    pub const fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Amplitude multiplier per octave.
    #[inline]
    #[must_use]
    pub const fn persistence(&self) -> f64 {
        self.persistence
    }

    /// Frequency multiplier per octave.
    #[inline]
    #[must_use]
    pub const fn lacunarity(&self) -> f64 {
        self.lacunarity
    }

    /// Coordinate divisor.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            octaves: Self::DEFAULT_OCTAVES,
            persistence: Self::DEFAULT_PERSISTENCE,
            lacunarity: Self::DEFAULT_LACUNARITY,
            scale: Self::DEFAULT_SCALE,
        }
    }
}

/// Multi-octave sampler over one Perlin noise field.
///
/// Cheap to clone: clones share the permutation table.
#[derive(Clone, Debug)]
pub struct FractalSampler {
    noise: PerlinNoise,
}

impl FractalSampler {
    /// Wraps a noise generator.
    #[must_use]
    pub fn new(noise: PerlinNoise) -> Self {
        Self { noise }
    }

    /// The underlying single-octave generator.
    #[inline]
    #[must_use]
    pub fn noise(&self) -> &PerlinNoise {
        &self.noise
    }

    /// Samples averaged fractal noise at world coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1] for `persistence` in `[0, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, params: &NoiseParams) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;

        for _ in 0..params.octaves {
            let sample_x = x / params.scale * frequency;
            let sample_y = y / params.scale * frequency;

            total += self.noise.sample(sample_x, sample_y) * amplitude;

            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }

        total / f64::from(params.octaves)
    }
}

/// Samples fractal noise straight from a table and raw parameters.
///
/// # Errors
///
/// Returns [`ProceduralError::InvalidParameter`] for `octaves < 1` or
/// `scale <= 0`.
pub fn sample_fractal_noise(
    table: &Arc<PermutationTable>,
    x: f64,
    y: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    scale: f64,
) -> ProceduralResult<f64> {
    let params = NoiseParams::new(octaves, persistence, lacunarity, scale)?;
    let sampler = FractalSampler::new(PerlinNoise::new(Arc::clone(table)));
    Ok(sampler.sample(x, y, &params))
}
