//! Microbenchmarks for the per-insertion building blocks:
//!
//! 1. **Predicates**: `orientation`, `classify` and `opposite_angle_sum_ok`
//! 2. **Point location**: grid lookup on a populated mesh
//! 3. **Incremental insertion**: one `insert` call, repair included

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use planar_delaunay::core::algorithms::locate::locate;
use planar_delaunay::geometry::util::generate_random_vertices_seeded;
use planar_delaunay::prelude::*;
use std::hint::black_box;

const SEED: u64 = 0xD1EA;

fn benchmark_predicates(c: &mut Criterion) {
    let tri = [
        vertex!(1, 0.0, 0.0),
        vertex!(2, 0.0, 2.0),
        vertex!(3, 2.0, 0.0),
    ];
    let inside = vertex!(4, 0.5, 0.5);
    let apex = vertex!(5, 2.0, 2.0);

    c.bench_function("orientation", |b| {
        b.iter(|| orientation(black_box(&tri[0]), &tri[1], &tri[2], DEFAULT_EPSILON));
    });
    c.bench_function("classify", |b| {
        b.iter(|| classify(black_box(&tri), black_box(&inside), DEFAULT_EPSILON));
    });
    c.bench_function("opposite_angle_sum_ok", |b| {
        b.iter(|| {
            opposite_angle_sum_ok(black_box(&tri[0]), &tri[1], &apex, &tri[2])
        });
    });
}

fn populated(n_points: usize) -> (DelaunayTriangulation, Vec<Vertex>) {
    let points =
        generate_random_vertices_seeded(n_points, (0.0, 100.0), SEED).expect("range is non-empty");
    let mut dt = DelaunayTriangulation::default();
    dt.bootstrap(&points).expect("bootstrap succeeds");
    for p in &points {
        dt.insert(*p).expect("insertion succeeds");
    }
    (dt, points)
}

fn benchmark_locate(c: &mut Criterion) {
    let (dt, _) = populated(2_000);
    let cache = dt.cache().expect("bootstrapped");
    let queries = generate_random_vertices_seeded(256, (0.0, 100.0), SEED + 1)
        .expect("range is non-empty");

    c.bench_function("locate_2000", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(locate(dt.tds(), cache, q).ok());
            }
        });
    });
}

fn benchmark_insert(c: &mut Criterion) {
    let (dt, _) = populated(1_000);
    let extra = vertex!(1_000_001, 50.123, 49.877);

    c.bench_function("insert_into_1000", |b| {
        b.iter_batched(
            || dt.clone(),
            |mut dt| black_box(dt.insert(extra)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, benchmark_predicates, benchmark_locate, benchmark_insert);
criterion_main!(benches);
