//! Run with:
//! ```bash
//! RUSTFLAGS="-C target-cpu=native" cargo bench --bench benchmark
//! ```

use annvec::Index;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// OpenAI text-embedding-ada-002 / text-embedding-3-small output dimension.
const DIM: usize = 1536;
/// Number of vectors in the index for the main benchmarks.
const N_VECS: usize = 10_000;
/// Top-k requested from every scan.
const K: usize = 10;
/// Extra candidates the binary stage overshoots by before re-ranking.
const OVERSHOOT: usize = 200;
/// Fixed RNG seed for reproducible benchmarks.
const SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

/// Generate `n` random f32 vectors of dimension `dim`. A seeded RNG keeps
/// the benchmark corpus identical across runs.
fn generate_random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect()).collect()
}

/// Builds an `Index` pre-loaded with `n_vecs` random vectors of `dim`.
fn build_index(n_vecs: usize, dim: usize) -> Index {
    let index = Index::with_capacity(dim, n_vecs);
    let vecs = generate_random_vectors(n_vecs, dim, SEED);
    for (i, v) in vecs.into_iter().enumerate() {
        index.add(i as i32, v).unwrap();
    }
    index
}

/// Measures the full-precision cosine scan: the hand-unrolled,
/// `get_unchecked` dot product over all `N_VECS` × `DIM` vectors.
///
/// `black_box()` prevents the compiler from hoisting the call out of the
/// loop or constant-folding the result away.
fn bench_search_full(c: &mut Criterion) {
    let index = build_index(N_VECS, DIM);
    let query = generate_random_vectors(1, DIM, SEED + 1).remove(0);

    let mut group = c.benchmark_group("search_full");
    group.throughput(Throughput::Elements(N_VECS as u64));
    group.bench_function(BenchmarkId::new("cosine_unrolled_8x", format!("{N_VECS}vecs_dim{DIM}")), |b| {
        b.iter(|| black_box(index.find_closest(black_box(&query), black_box(K)).unwrap()))
    });
    group.finish();
}

/// Measures the coarse binary scan: 4-wide unrolled XOR-popcount over the
/// packed sign bits, ~32x less memory traffic than the full-precision
/// scan at the same vector count.
fn bench_search_binary(c: &mut Criterion) {
    let index = build_index(N_VECS, DIM);
    let query = generate_random_vectors(1, DIM, SEED + 1).remove(0);

    let mut group = c.benchmark_group("search_binary");
    group.throughput(Throughput::Elements(N_VECS as u64));
    group.bench_function(BenchmarkId::new("hamming_unrolled_4x", format!("{N_VECS}vecs_dim{DIM}")), |b| {
        b.iter(|| black_box(index.find_closest_binary(black_box(&query), black_box(K + OVERSHOOT)).unwrap()))
    });
    group.finish();
}

/// Measures how full-precision search latency scales from 100 to 10,000
/// vectors. Expected: linear — each added vector costs exactly one dot
/// product. Any super-linear behavior indicates cache pressure (working
/// set exceeds L3).
fn bench_scaling(c: &mut Criterion) {
    let query = generate_random_vectors(1, DIM, SEED + 99).remove(0);

    let mut group = c.benchmark_group("scaling_by_n_vecs");
    for n in [100usize, 500, 1_000, 5_000, 10_000] {
        let index = build_index(n, DIM);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _n| {
            b.iter(|| black_box(index.find_closest(black_box(&query), black_box(K)).unwrap()))
        });
    }
    group.finish();
}

/// Measures how fast vectors can be normalized, packed, and appended.
/// Bounds the index build rate — relevant for live-ingestion workloads.
fn bench_add(c: &mut Criterion) {
    let vecs = generate_random_vectors(N_VECS, DIM, SEED);

    let mut group = c.benchmark_group("add_throughput");
    group.throughput(Throughput::Elements(1));
    group.bench_function("add_single_vector", |b| {
        b.iter_batched(
            || (Index::with_capacity(DIM, N_VECS + 1), vecs[0].clone()),
            |(index, v)| {
                index.add(0, black_box(v)).unwrap();
                index
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_search_full, bench_search_binary, bench_scaling, bench_add);
criterion_main!(benches);
