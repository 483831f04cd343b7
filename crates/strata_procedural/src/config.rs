//! # World Configuration
//!
//! TOML-backed settings for one generation run. Every field has a default,
//! so an empty document describes the stock 500x500 world.
//!
//! ```toml
//! seed = 42
//!
//! [world]
//! width = 500
//! height = 500
//! chunk_size = 16
//!
//! [noise]
//! octaves = 6
//! persistence = 0.5
//! lacunarity = 2.0
//! scale = 100.0
//! lattice = "floor"
//!
//! [generation]
//! workers = 4
//!
//! [palette]
//! kind = "binary"
//! threshold = 45
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkGenerator, WorldBounds, CHUNK_SIZE};
use crate::error::{ProceduralError, ProceduralResult};
use crate::fractal::{FractalSampler, NoiseParams};
use crate::noise::{LatticeMode, PerlinNoise, PermutationTable, WorldSeed};
use crate::palette::{ColorBand, ColorBanding};
use crate::walker::TileWalker;

/// Smallest seed picked for unseeded runs.
pub const SEED_MIN: u64 = 10;
/// Largest seed picked for unseeded runs.
pub const SEED_MAX: u64 = 10_000;

/// Complete configuration for a generation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Fixed seed. `None` means pick one per run.
    pub seed: Option<u64>,
    /// World and tile dimensions.
    pub world: WorldSection,
    /// Octave parameters.
    pub noise: NoiseSection,
    /// Threading.
    pub generation: GenerationSection,
    /// Value-to-color banding for renderers.
    pub palette: PaletteConfig,
}

/// `[world]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldSection {
    /// World width in cells.
    pub width: u32,
    /// World height in cells.
    pub height: u32,
    /// Tile side length in cells.
    pub chunk_size: u32,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// `[noise]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseSection {
    /// Number of octaves.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Coordinate divisor.
    pub scale: f64,
    /// Lattice indexing rule.
    pub lattice: LatticeMode,
}

impl Default for NoiseSection {
    fn default() -> Self {
        Self {
            octaves: NoiseParams::DEFAULT_OCTAVES,
            persistence: NoiseParams::DEFAULT_PERSISTENCE,
            lacunarity: NoiseParams::DEFAULT_LACUNARITY,
            scale: NoiseParams::DEFAULT_SCALE,
            lattice: LatticeMode::Floor,
        }
    }
}

/// `[generation]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSection {
    /// Worker threads. 1 generates on the calling thread.
    pub workers: usize,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// `[palette]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaletteConfig {
    /// Gray ramp with black highlands.
    #[default]
    Terrain,
    /// Two-color split.
    Binary {
        /// First value drawn black.
        #[serde(default = "default_threshold")]
        threshold: u8,
    },
    /// Explicit bands.
    Custom {
        /// Bands sorted by lower bound, the first starting at 0.
        bands: Vec<ColorBand>,
    },
}

fn default_threshold() -> u8 {
    ColorBanding::DEFAULT_THRESHOLD
}

impl WorldConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidConfig`] on syntax errors, type
    /// mismatches or unknown keys.
    pub fn from_toml_str(text: &str) -> ProceduralResult<Self> {
        toml::from_str(text).map_err(|e| ProceduralError::InvalidConfig(e.to_string()))
    }

    /// Renders the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> ProceduralResult<String> {
        toml::to_string_pretty(self).map_err(|e| ProceduralError::InvalidConfig(e.to_string()))
    }

    /// The configured seed, or one drawn from `entropy` in
    /// `[SEED_MIN, SEED_MAX]`.
    #[must_use]
    pub fn resolve_seed(&self, entropy: u64) -> WorldSeed {
        let seed = self
            .seed
            .unwrap_or_else(|| SEED_MIN + entropy % (SEED_MAX - SEED_MIN + 1));
        WorldSeed::new(seed)
    }

    /// Validated octave parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] for out-of-range values.
    pub fn noise_params(&self) -> ProceduralResult<NoiseParams> {
        let n = &self.noise;
        NoiseParams::new(n.octaves, n.persistence, n.lacunarity, n.scale)
    }

    /// Validated world bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] for a zero dimension.
    pub fn world_bounds(&self) -> ProceduralResult<WorldBounds> {
        WorldBounds::new(self.world.width, self.world.height)
    }

    /// The banding renderers should use.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] for malformed bands.
    pub fn palette(&self) -> ProceduralResult<ColorBanding> {
        match &self.palette {
            PaletteConfig::Terrain => Ok(ColorBanding::terrain()),
            PaletteConfig::Binary { threshold } => ColorBanding::binary(*threshold),
            PaletteConfig::Custom { bands } => ColorBanding::new(bands.clone()),
        }
    }

    /// Builds the table for `seed` and a walker over the configured world.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if any section is out
    /// of range.
    pub fn build_walker(&self, seed: WorldSeed) -> ProceduralResult<TileWalker> {
        let params = self.noise_params()?;
        let world = self.world_bounds()?;

        let table = Arc::new(PermutationTable::build(seed));
        let noise = PerlinNoise::new(table).with_lattice(self.noise.lattice);
        let generator = ChunkGenerator::new(FractalSampler::new(noise), params);

        TileWalker::new(generator, world, self.world.chunk_size)?.with_workers(self.generation.workers)
    }
}
