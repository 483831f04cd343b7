//! # STRATA Procedural Generation
//!
//! Deterministic fractal-noise height-fields, generated tile by tile.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same tiles
//! 2. **Explicit state**: The permutation table is a value, never a global
//! 3. **Chunked**: The world is generated in fixed-size square tiles
//! 4. **Streamable**: Tiles are independent and can be generated in parallel
//!
//! ## Core Components
//!
//! - `PermutationTable`: Seeded 512-entry lattice hash
//! - `PerlinNoise`: 2D gradient noise in `[0, 1]`
//! - `FractalSampler`: Octave-averaged noise
//! - `ChunkGenerator`: Quantized, world-clipped tiles
//! - `TileWalker`: Row-major traversal with ordered parallel delivery
//! - `ColorBanding`: Value-to-color contract for renderers
//!
//! ## Example
//!
//! ```rust
//! use strata_procedural::{ChunkGenerator, NoiseParams, TileWalker, WorldBounds, WorldSeed};
//!
//! let generator = ChunkGenerator::from_seed(WorldSeed::new(42), NoiseParams::default());
//! let world = WorldBounds::new(32, 32)?;
//! let walker = TileWalker::new(generator, world, 16)?;
//!
//! let mut origins = Vec::new();
//! walker.walk(|chunk| origins.push((chunk.origin_x(), chunk.origin_y())))?;
//! assert_eq!(origins, [(0, 0), (16, 0), (0, 16), (16, 16)]);
//! # Ok::<(), strata_procedural::ProceduralError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod fractal;
pub mod noise;
pub mod palette;
pub mod walker;

pub use chunk::{generate_chunk, quantize, Chunk, ChunkGenerator, WorldBounds, CHUNK_SIZE};
pub use config::{PaletteConfig, WorldConfig};
pub use error::{ProceduralError, ProceduralResult};
pub use fractal::{sample_fractal_noise, FractalSampler, NoiseParams};
pub use noise::{build_permutation_table, LatticeMode, PerlinNoise, PermutationTable, WorldSeed};
pub use palette::{ColorBand, ColorBanding, Rgb};
pub use walker::{for_each_chunk, CancelToken, TileWalker, WalkSummary};
