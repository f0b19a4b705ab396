//! Benchmarks for end-to-end triangulation of random point clouds.

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use planar_delaunay::geometry::util::generate_random_vertices_seeded;
use planar_delaunay::prelude::*;
use std::hint::black_box;
use std::sync::OnceLock;

/// Get the deterministic seed for random point generation.
/// Reads `PLANAR_DELAUNAY_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xD1EA.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("PLANAR_DELAUNAY_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xD1EA)
    })
}

fn benchmark_triangulate(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("triangulate");

    for n_points in [100_usize, 1_000, 10_000] {
        let points = generate_random_vertices_seeded(n_points, (-100.0, 100.0), seed)
            .expect("range is non-empty");
        group.throughput(Throughput::Elements(n_points as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_points), &points, |b, points| {
            b.iter(|| {
                let output = triangulate(black_box(points), DelaunayConfig::default())
                    .expect("triangulation succeeds");
                black_box(output);
            });
        });
    }
    group.finish();
}

fn benchmark_growth_factor(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let points = generate_random_vertices_seeded(5_000, (0.0, 1_000.0), seed)
        .expect("range is non-empty");
    let mut group = c.benchmark_group("growth_factor");

    for growth_factor in [1_usize, 5, 20] {
        let config = DelaunayConfigBuilder::default()
            .growth_factor(growth_factor)
            .build()
            .expect("valid config");
        group.bench_with_input(
            BenchmarkId::from_parameter(growth_factor),
            &config,
            |b, config| {
                b.iter_batched(
                    || DelaunayTriangulation::new(config.clone()),
                    |mut dt| black_box(dt.triangulate(&points).expect("triangulation succeeds")),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_triangulate, benchmark_growth_factor);
criterion_main!(benches);
