//! Benchmark for chunk generation performance.
//!
//! Run with: cargo bench --package strata_procedural --bench chunk_benchmark

// criterion_group! emits an undocumented `pub fn`
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use strata_procedural::{ChunkGenerator, NoiseParams, TileWalker, WorldBounds, WorldSeed, CHUNK_SIZE};

fn generator() -> ChunkGenerator {
    ChunkGenerator::from_seed(WorldSeed::new(42), NoiseParams::default())
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let gen = generator();
    let world = WorldBounds::new(u32::MAX, u32::MAX).unwrap();

    c.bench_function("single_chunk_generation", |b| {
        let mut origin = 0u32;
        b.iter(|| {
            origin = origin.wrapping_add(CHUNK_SIZE);
            black_box(gen.generate(origin, origin / 2, CHUNK_SIZE, world))
        });
    });
}

fn benchmark_world_walk(c: &mut Criterion) {
    let world = WorldBounds::new(512, 512).unwrap();

    let mut group = c.benchmark_group("world_walk_512");
    group.throughput(Throughput::Elements(32 * 32));
    group.sample_size(10);

    for workers in [1, 4] {
        let walker = TileWalker::new(generator(), world, CHUNK_SIZE)
            .and_then(|w| w.with_workers(workers))
            .unwrap();

        group.bench_function(format!("{workers}_workers"), |b| {
            b.iter(|| {
                walker.walk(|chunk| {
                    let _ = black_box(chunk);
                })
            });
        });
    }

    group.finish();
}

fn benchmark_tile_compression(c: &mut Criterion) {
    let world = WorldBounds::new(64, 64).unwrap();
    let chunk = generator().generate(0, 0, CHUNK_SIZE, world).unwrap();

    c.bench_function("tile_compression", |b| {
        b.iter(|| black_box(chunk.to_compressed()));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = benchmark_single_chunk,
              benchmark_world_walk,
              benchmark_tile_compression
}

criterion_main!(benches);
