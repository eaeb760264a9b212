//! Benchmarks for nearest-neighbor queries.
//!
//! Measures end-to-end query latency over in-memory trees of varying size,
//! dimensionality, and result count.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use proxima::{nearest, BkdTree, BkdTreeParams, Segment};
use rand::prelude::*;

fn build_tree(n: usize, dims: usize, seed: u64) -> BkdTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = BkdTree::new(dims, BkdTreeParams::default()).expect("Failed to create tree");
    for i in 0..n {
        let coords: Vec<f32> = (0..dims).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        tree.add(i as u32, &coords).expect("Failed to add point");
    }
    tree.build().expect("Failed to build tree");
    tree
}

fn random_origins(count: usize, dims: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1000.0..1000.0)).collect())
        .collect()
}

fn bench_index_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_by_index_size");

    for &n in [1_000usize, 10_000, 100_000].iter() {
        let tree = build_tree(n, 4, 42);
        let segments = vec![Segment::over_tree(&tree, 0, None).expect("Failed to make segment")];
        let origins = random_origins(64, 4, 7);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut i = 0;
            b.iter(|| {
                let origin = &origins[i % origins.len()];
                i += 1;
                black_box(nearest(&segments, 10, origin).expect("Search failed"))
            });
        });
    }
    group.finish();
}

fn bench_dimensions(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_by_dimension");

    for &dims in [2usize, 4, 8].iter() {
        let tree = build_tree(20_000, dims, 42);
        let segments = vec![Segment::over_tree(&tree, 0, None).expect("Failed to make segment")];
        let origins = random_origins(64, dims, 7);

        group.bench_with_input(BenchmarkId::from_parameter(dims), &dims, |b, _| {
            let mut i = 0;
            b.iter(|| {
                let origin = &origins[i % origins.len()];
                i += 1;
                black_box(nearest(&segments, 10, origin).expect("Search failed"))
            });
        });
    }
    group.finish();
}

fn bench_topn(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_by_topn");

    let tree = build_tree(20_000, 4, 42);
    let segments = vec![Segment::over_tree(&tree, 0, None).expect("Failed to make segment")];
    let origins = random_origins(64, 4, 7);

    for &k in [1usize, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            let mut i = 0;
            b.iter(|| {
                let origin = &origins[i % origins.len()];
                i += 1;
                black_box(nearest(&segments, k, origin).expect("Search failed"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_size, bench_dimensions, bench_topn);
criterion_main!(benches);
