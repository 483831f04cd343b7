//! # Tile Walker
//!
//! Sequences chunk generation over the whole world and hands every tile to
//! a sink.
//!
//! ## Delivery Order
//!
//! Tiles are always delivered row-major: top row first, left to right
//! within a row. Progressive renderers depend on this to reveal the map
//! as a sweep rather than as scattered squares.
//!
//! ## Parallel Generation
//!
//! ```text
//! ┌──────────┐  jobs   ┌──────────┐  (index, chunk)  ┌────────────┐
//! │  origins │────────>│ worker N │─────────────────>│  reorder   │──> sink
//! └──────────┘         └──────────┘                  └─────┬──────┘
//!      ^                                                   │
//!      └───────────────── one job per delivery ────────────┘
//! ```
//!
//! Workers finish out of order; the delivering thread buffers early
//! arrivals until the next expected index shows up. Origins are issued
//! lazily, a fixed window ahead of delivery, so memory stays bounded for
//! any world size and a slow tile cannot let the others run away.
//! Cancellation is checked between chunks, never inside one.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Sender};

use crate::chunk::{Chunk, ChunkGenerator, WorldBounds};
use crate::error::{ProceduralError, ProceduralResult};

/// Cooperative cancellation flag shared between a walk and its controller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect at the next chunk boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation was requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkSummary {
    /// Tiles handed to the sink.
    pub delivered: usize,
    /// Tiles in the whole world.
    pub total: usize,
    /// Whether the walk stopped early.
    pub cancelled: bool,
}

/// Drives a [`ChunkGenerator`] across a bounded world.
#[derive(Clone, Debug)]
pub struct TileWalker {
    generator: ChunkGenerator,
    world: WorldBounds,
    chunk_size: u32,
    workers: usize,
}

impl TileWalker {
    /// Creates a single-threaded walker.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `chunk_size` is zero.
    pub fn new(generator: ChunkGenerator, world: WorldBounds, chunk_size: u32) -> ProceduralResult<Self> {
        if chunk_size == 0 {
            return Err(ProceduralError::invalid("chunk_size", "must be greater than 0"));
        }
        Ok(Self {
            generator,
            world,
            chunk_size,
            workers: 1,
        })
    }

    /// Sets the number of generation threads.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `workers` is zero.
    pub fn with_workers(mut self, workers: usize) -> ProceduralResult<Self> {
        if workers == 0 {
            return Err(ProceduralError::invalid("workers", "must be at least 1"));
        }
        self.workers = workers;
        Ok(self)
    }

    /// The world being walked.
    #[inline]
    #[must_use]
    pub fn world(&self) -> WorldBounds {
        self.world
    }

    /// Chunk side length.
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Number of generation threads.
    #[inline]
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tile origins in delivery order.
    pub fn origins(&self) -> impl Iterator<Item = (u32, u32)> {
        let step = self.chunk_size as usize;
        let width = self.world.width();
        (0..self.world.height())
            .step_by(step)
            .flat_map(move |y| (0..width).step_by(step).map(move |x| (x, y)))
    }

    /// Number of tiles covering the world, partial edge tiles included.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        let across = self.world.width().div_ceil(self.chunk_size) as usize;
        let down = self.world.height().div_ceil(self.chunk_size) as usize;
        across * down
    }

    /// Walks the whole world.
    ///
    /// # Errors
    ///
    /// Propagates the first chunk generation error.
    pub fn walk<F>(&self, sink: F) -> ProceduralResult<WalkSummary>
    where
        F: FnMut(Chunk),
    {
        self.walk_until(&CancelToken::new(), sink)
    }

    /// Walks the world until finished or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Propagates the first chunk generation error.
    pub fn walk_until<F>(&self, cancel: &CancelToken, sink: F) -> ProceduralResult<WalkSummary>
    where
        F: FnMut(Chunk),
    {
        tracing::info!(
            width = self.world.width(),
            height = self.world.height(),
            chunk_size = self.chunk_size,
            tiles = self.tile_count(),
            workers = self.workers,
            "walking world"
        );

        let summary = if self.workers == 1 {
            self.walk_sequential(cancel, sink)?
        } else {
            self.walk_parallel(cancel, sink)?
        };

        if summary.cancelled {
            tracing::info!(delivered = summary.delivered, total = summary.total, "walk cancelled");
        } else {
            tracing::info!(delivered = summary.delivered, "walk complete");
        }
        Ok(summary)
    }

    fn walk_sequential<F>(&self, cancel: &CancelToken, mut sink: F) -> ProceduralResult<WalkSummary>
    where
        F: FnMut(Chunk),
    {
        let total = self.tile_count();
        let mut delivered = 0;

        for (x, y) in self.origins() {
            if cancel.is_cancelled() {
                break;
            }
            sink(self.generator.generate(x, y, self.chunk_size, self.world)?);
            delivered += 1;
        }

        Ok(self.summarize(cancel, delivered, total))
    }

    fn walk_parallel<F>(&self, cancel: &CancelToken, mut sink: F) -> ProceduralResult<WalkSummary>
    where
        F: FnMut(Chunk),
    {
        let total = self.tile_count();
        let window = self.workers * IN_FLIGHT_PER_WORKER;

        std::thread::scope(|scope| {
            // Both channels live in this closure so they drop before the
            // scope joins, which releases every worker.
            let (job_tx, job_rx) = bounded::<Job>(window);
            let (done_tx, done_rx) = bounded::<(usize, ProceduralResult<Chunk>)>(window);

            for worker in 0..self.workers {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                let cancel = cancel.clone();
                let generator = &self.generator;
                let (chunk_size, world) = (self.chunk_size, self.world);

                scope.spawn(move || {
                    for (index, (x, y)) in jobs.iter() {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let result = generator.generate(x, y, chunk_size, world);
                        if done.send((index, result)).is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker, "tile worker finished");
                });
            }
            drop(job_rx);
            drop(done_tx);

            // A new job is issued only when a tile is delivered, so at most
            // `window` tiles are queued, generating or waiting for reorder.
            let mut origins = self.origins().enumerate();
            let mut job_tx = Some(job_tx);
            for _ in 0..window {
                issue_next(&mut origins, &mut job_tx);
            }

            let mut pending = BTreeMap::new();
            let mut delivered = 0;

            for (index, result) in &done_rx {
                pending.insert(index, result);
                while let Some(result) = pending.remove(&delivered) {
                    if cancel.is_cancelled() {
                        return Ok(self.summarize(cancel, delivered, total));
                    }
                    sink(result?);
                    delivered += 1;
                    issue_next(&mut origins, &mut job_tx);
                }
            }

            Ok(self.summarize(cancel, delivered, total))
        })
    }

    fn summarize(&self, cancel: &CancelToken, delivered: usize, total: usize) -> WalkSummary {
        WalkSummary {
            delivered,
            total,
            cancelled: cancel.is_cancelled() && delivered < total,
        }
    }
}

/// Tile index in delivery order, and its origin.
type Job = (usize, (u32, u32));

/// Tiles each parallel worker may have outstanding ahead of delivery.
const IN_FLIGHT_PER_WORKER: usize = 4;

/// Queues the next origin, or closes the job channel once none remain.
///
/// Never blocks: the caller keeps the number of outstanding jobs within
/// the channel's capacity.
fn issue_next(origins: &mut impl Iterator<Item = Job>, job_tx: &mut Option<Sender<Job>>) {
    match (origins.next(), job_tx.as_ref()) {
        (Some(job), Some(tx)) => {
            if tx.send(job).is_err() {
                *job_tx = None;
            }
        }
        _ => *job_tx = None,
    }
}

/// Walks a world row-major, calling `callback(chunk, origin_x, origin_y)`
/// for every tile.
///
/// # Errors
///
/// Returns [`ProceduralError::InvalidParameter`] for a zero chunk size or
/// a zero world dimension.
pub fn for_each_chunk<F>(
    generator: &ChunkGenerator,
    world_width: u32,
    world_height: u32,
    chunk_size: u32,
    mut callback: F,
) -> ProceduralResult<WalkSummary>
where
    F: FnMut(Chunk, u32, u32),
{
    let world = WorldBounds::new(world_width, world_height)?;
    TileWalker::new(generator.clone(), world, chunk_size)?.walk(|chunk| {
        let (x, y) = (chunk.origin_x(), chunk.origin_y());
        callback(chunk, x, y);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::NoiseParams;
    use crate::noise::WorldSeed;

    fn walker(width: u32, height: u32, chunk_size: u32) -> TileWalker {
        let generator = ChunkGenerator::from_seed(WorldSeed::new(42), NoiseParams::default());
        TileWalker::new(generator, WorldBounds::new(width, height).unwrap(), chunk_size).unwrap()
    }

    #[test]
    fn test_row_major_origins() {
        let origins: Vec<_> = walker(40, 20, 16).origins().collect();
        assert_eq!(
            origins,
            vec![(0, 0), (16, 0), (32, 0), (0, 16), (16, 16), (32, 16)]
        );
        assert_eq!(walker(40, 20, 16).tile_count(), 6);
    }

    #[test]
    fn test_partial_edge_tiles() {
        let mut tiles = Vec::new();
        let summary = walker(20, 20, 16).walk(|chunk| tiles.push(chunk)).unwrap();

        assert_eq!(summary.delivered, 4);
        assert!(!summary.cancelled);
        assert_eq!(tiles[0].populated_count(), 256);
        assert_eq!(tiles[1].populated_count(), 4 * 16);
        assert_eq!(tiles[2].populated_count(), 16 * 4);
        assert_eq!(tiles[3].populated_count(), 4 * 4);

        let covered: usize = tiles.iter().map(Chunk::populated_count).sum();
        assert_eq!(covered, 20 * 20);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = walker(70, 50, 16);
        let parallel = sequential.clone().with_workers(4).unwrap();

        let mut expected = Vec::new();
        sequential.walk(|chunk| expected.push(chunk)).unwrap();

        let mut actual = Vec::new();
        let summary = parallel.walk(|chunk| actual.push(chunk)).unwrap();

        assert_eq!(summary.delivered, sequential.tile_count());
        assert_eq!(actual, expected, "Parallel walk must deliver the same tiles in the same order");
    }

    #[test]
    fn test_cancellation_between_chunks() {
        for workers in [1, 3] {
            let walker = walker(64, 64, 16).with_workers(workers).unwrap();
            let cancel = CancelToken::new();
            let mut origins = Vec::new();

            let summary = walker
                .walk_until(&cancel, |chunk| {
                    origins.push((chunk.origin_x(), chunk.origin_y()));
                    if origins.len() == 2 {
                        cancel.cancel();
                    }
                })
                .unwrap();

            assert_eq!(summary.delivered, 2, "workers = {workers}");
            assert_eq!(summary.total, 16);
            assert!(summary.cancelled);
            assert_eq!(origins, vec![(0, 0), (16, 0)]);
        }
    }

    #[test]
    fn test_parallel_cancel_on_huge_world_is_prompt() {
        let walker = walker(64_000, 64_000, 16).with_workers(4).unwrap();
        assert_eq!(walker.tile_count(), 16_000_000);

        let cancel = CancelToken::new();
        let start = std::time::Instant::now();
        let mut first_tile_after = None;

        let summary = walker
            .walk_until(&cancel, |_| {
                first_tile_after.get_or_insert(start.elapsed());
                cancel.cancel();
            })
            .unwrap();

        assert_eq!(summary.delivered, 1);
        assert!(summary.cancelled);
        let first = first_tile_after.unwrap();
        assert!(first < std::time::Duration::from_secs(1), "First tile took {first:?}");
        assert!(start.elapsed() < std::time::Duration::from_secs(2), "Walk took {:?}", start.elapsed());
    }

    #[test]
    fn test_issue_next_closes_when_exhausted() {
        let (tx, rx) = bounded::<Job>(IN_FLIGHT_PER_WORKER);
        let mut origins = walker(16, 32, 16).origins().enumerate();
        let mut job_tx = Some(tx);

        for _ in 0..IN_FLIGHT_PER_WORKER {
            issue_next(&mut origins, &mut job_tx);
        }

        assert!(job_tx.is_none(), "Sender should drop once origins run out");
        let jobs: Vec<Job> = rx.iter().collect();
        assert_eq!(jobs, vec![(0, (0, 0)), (1, (0, 16))]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let summary = walker(32, 32, 16).walk_until(&cancel, |_| {}).unwrap();
        assert_eq!(summary.delivered, 0);
        assert!(summary.cancelled);
    }

    #[test]
    fn test_for_each_chunk_passes_origins() {
        let generator = ChunkGenerator::from_seed(WorldSeed::new(1), NoiseParams::default());
        let mut seen = Vec::new();
        for_each_chunk(&generator, 32, 16, 16, |chunk, x, y| {
            assert_eq!((chunk.origin_x(), chunk.origin_y()), (x, y));
            seen.push((x, y));
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 0), (16, 0)]);
    }

    #[test]
    fn test_rejects_invalid_walker() {
        let generator = ChunkGenerator::from_seed(WorldSeed::new(1), NoiseParams::default());
        let world = WorldBounds::new(16, 16).unwrap();
        assert!(TileWalker::new(generator.clone(), world, 0).is_err());
        assert!(TileWalker::new(generator.clone(), world, 16).unwrap().with_workers(0).is_err());
        assert!(for_each_chunk(&generator, 0, 16, 16, |_, _, _| {}).is_err());
    }
}
