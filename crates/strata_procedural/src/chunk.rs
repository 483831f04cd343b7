//! # Chunk System
//!
//! The world is a bounded rectangle of cells, cut into square chunks for:
//! - Incremental rendering (hand each tile off as soon as it exists)
//! - Streaming (tiles are independent, generate and discard freely)
//! - Parallel generation (no state is shared between tiles)
//!
//! ## Chunk Format
//!
//! A chunk is `size x size` cells, each an `Option<u8>`: the quantized
//! height, or `None` where the cell lies outside the world. Edge chunks of
//! a world that is not a multiple of the chunk size keep their square shape
//! and simply leave the overhang unset.
//!
//! ## Transport
//!
//! Chunks encode to LZ4-compressed bytes for consumers that persist or
//! ship tiles.

use std::sync::Arc;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{ProceduralError, ProceduralResult};
use crate::fractal::{FractalSampler, NoiseParams};
use crate::noise::{PerlinNoise, PermutationTable, WorldSeed};

/// Default chunk width/height in cells.
pub const CHUNK_SIZE: u32 = 16;

/// Encoded header: origin x, origin y, size (little-endian u32 each).
const HEADER_LEN: usize = 12;

/// The bounded world rectangle `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldBounds {
    width: u32,
    height: u32,
}

impl WorldBounds {
    /// Creates world bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> ProceduralResult<Self> {
        if width == 0 {
            return Err(ProceduralError::invalid("world_width", "must be greater than 0"));
        }
        if height == 0 {
            return Err(ProceduralError::invalid("world_height", "must be greater than 0"));
        }
        Ok(Self { width, height })
    }

    /// World width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// World height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if the cell lies inside the world.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: u64, y: u64) -> bool {
        x < u64::from(self.width) && y < u64::from(self.height)
    }
}

/// A square tile of quantized heights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    origin_x: u32,
    origin_y: u32,
    size: u32,
    /// Row-major cells (indexed as `[dy * size + dx]`).
    cells: Vec<Option<u8>>,
}

impl Chunk {
    /// Creates an empty chunk with every cell unset.
    fn empty(origin_x: u32, origin_y: u32, size: u32) -> Self {
        let side = size as usize;
        Self {
            origin_x,
            origin_y,
            size,
            cells: vec![None; side * side],
        }
    }

    /// World X of the top-left cell.
    #[inline]
    #[must_use]
    pub const fn origin_x(&self) -> u32 {
        self.origin_x
    }

    /// World Y of the top-left cell.
    #[inline]
    #[must_use]
    pub const fn origin_y(&self) -> u32 {
        self.origin_y
    }

    /// Side length in cells.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Gets the value at local coordinates.
    ///
    /// `None` for cells outside the world or outside the chunk.
    #[inline]
    #[must_use]
    pub fn get(&self, dx: u32, dy: u32) -> Option<u8> {
        if dx < self.size && dy < self.size {
            self.cells[self.index(dx, dy)]
        } else {
            None
        }
    }

    #[inline]
    fn index(&self, dx: u32, dy: u32) -> usize {
        dy as usize * self.size as usize + dx as usize
    }

    /// Row-major cells, one slice per row.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<u8>]> {
        self.cells.chunks(self.size as usize)
    }

    /// Populated cells as `(world_x, world_y, value)`.
    pub fn populated(&self) -> impl Iterator<Item = (u32, u32, u8)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let dx = (i % self.size as usize) as u32;
            let dy = (i / self.size as usize) as u32;
            cell.map(|v| (self.origin_x + dx, self.origin_y + dy, v))
        })
    }

    /// Number of cells holding a value.
    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Returns true if every cell holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Encodes the chunk as LZ4-compressed bytes.
    ///
    /// Layout before compression: 12-byte header, one presence byte per
    /// cell, one value byte per cell.
    #[must_use]
    pub fn to_compressed(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(HEADER_LEN + self.cells.len() * 2);
        raw.extend_from_slice(&self.origin_x.to_le_bytes());
        raw.extend_from_slice(&self.origin_y.to_le_bytes());
        raw.extend_from_slice(&self.size.to_le_bytes());
        raw.extend(self.cells.iter().map(|c| u8::from(c.is_some())));
        raw.extend(self.cells.iter().map(|c| c.unwrap_or(0)));
        compress_prepend_size(&raw)
    }

    /// Decodes a chunk produced by [`Chunk::to_compressed`].
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::CorruptTile`] if decompression fails or
    /// the payload is malformed.
    pub fn from_compressed(bytes: &[u8]) -> ProceduralResult<Self> {
        let raw = decompress_size_prepended(bytes)
            .map_err(|e| ProceduralError::CorruptTile(e.to_string()))?;

        if raw.len() < HEADER_LEN {
            return Err(ProceduralError::CorruptTile("truncated header".to_string()));
        }
        let word = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let (origin_x, origin_y, size) = (word(0), word(4), word(8));
        if size == 0 {
            return Err(ProceduralError::CorruptTile("zero chunk size".to_string()));
        }

        let cell_count = (size as usize)
            .checked_mul(size as usize)
            .ok_or_else(|| ProceduralError::CorruptTile("chunk size overflow".to_string()))?;
        let body = &raw[HEADER_LEN..];
        if body.len() != cell_count * 2 {
            return Err(ProceduralError::CorruptTile(format!(
                "expected {} payload bytes, found {}",
                cell_count * 2,
                body.len()
            )));
        }

        let (mask, values) = body.split_at(cell_count);
        let cells = mask
            .iter()
            .zip(values)
            .map(|(&present, &value)| match present {
                0 => Ok(None),
                1 => Ok(Some(value)),
                other => Err(ProceduralError::CorruptTile(format!("bad presence byte {other}"))),
            })
            .collect::<ProceduralResult<Vec<_>>>()?;

        Ok(Self {
            origin_x,
            origin_y,
            size,
            cells,
        })
    }
}

/// Maps an averaged height onto `[0, 255]` (truncate, then clamp).
#[inline]
#[must_use]
pub fn quantize(height: f64) -> u8 {
    ((height * 255.0) as i64).clamp(0, 255) as u8
}

/// Chunk generator using fractal noise.
///
/// Holds no per-chunk state: any number of chunks may be generated from
/// one generator, in any order, from any number of threads.
#[derive(Clone, Debug)]
pub struct ChunkGenerator {
    /// Fractal sampler over the shared permutation table.
    sampler: FractalSampler,
    /// Octave parameters applied to every cell.
    params: NoiseParams,
}

impl ChunkGenerator {
    /// Creates a chunk generator.
    #[must_use]
    pub fn new(sampler: FractalSampler, params: NoiseParams) -> Self {
        Self { sampler, params }
    }

    /// Builds the table for `seed` and a generator over it.
    #[must_use]
    pub fn from_seed(seed: WorldSeed, params: NoiseParams) -> Self {
        Self::new(FractalSampler::new(PerlinNoise::from_seed(seed)), params)
    }

    /// The octave parameters.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// The fractal sampler.
    #[inline]
    #[must_use]
    pub fn sampler(&self) -> &FractalSampler {
        &self.sampler
    }

    /// Generates the chunk whose top-left cell is `(origin_x, origin_y)`.
    ///
    /// Cells at `x >= world.width()` or `y >= world.height()` are left
    /// unset and never sampled.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `chunk_size` is zero.
    pub fn generate(
        &self,
        origin_x: u32,
        origin_y: u32,
        chunk_size: u32,
        world: WorldBounds,
    ) -> ProceduralResult<Chunk> {
        if chunk_size == 0 {
            return Err(ProceduralError::invalid("chunk_size", "must be greater than 0"));
        }

        let mut chunk = Chunk::empty(origin_x, origin_y, chunk_size);

        for dy in 0..chunk_size {
            for dx in 0..chunk_size {
                let x = u64::from(origin_x) + u64::from(dx);
                let y = u64::from(origin_y) + u64::from(dy);

                if !world.contains(x, y) {
                    continue;
                }

                let height = self.sampler.sample(x as f64, y as f64, &self.params);
                let index = chunk.index(dx, dy);
                chunk.cells[index] = Some(quantize(height));
            }
        }

        Ok(chunk)
    }
}

/// Generates one chunk straight from a table and raw dimensions.
///
/// # Errors
///
/// Returns [`ProceduralError::InvalidParameter`] for a zero chunk size or
/// a zero world dimension.
pub fn generate_chunk(
    table: &Arc<PermutationTable>,
    origin_x: u32,
    origin_y: u32,
    chunk_size: u32,
    world_width: u32,
    world_height: u32,
    params: NoiseParams,
) -> ProceduralResult<Chunk> {
    let world = WorldBounds::new(world_width, world_height)?;
    let sampler = FractalSampler::new(PerlinNoise::new(Arc::clone(table)));
    ChunkGenerator::new(sampler, params).generate(origin_x, origin_y, chunk_size, world)
}
