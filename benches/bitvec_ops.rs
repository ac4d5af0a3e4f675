//! Bit-vector kernel benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench bitvec_ops
//! ```

use std::hint::black_box;

use bitarray_rs::bitops::combine_weight;
use bitarray_rs::terms::{Basis, Polynomial, TermSearch};
use bitarray_rs::{BitOrder, BitVector, Op};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn random_vector(rng: &mut ChaCha8Rng, nbits: usize) -> BitVector {
    let bytes: Vec<u8> = (0..nbits.div_ceil(8)).map(|_| rng.random()).collect();
    let mut v = BitVector::from_bytes(&bytes, BitOrder::Little);
    v.resize(nbits).unwrap();
    v
}

fn random_basis(seed: u64, m: usize, nbits: usize) -> Vec<BitVector> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..m).map(|_| random_vector(&mut rng, nbits)).collect()
}

// ============================================================================
// Benchmark: Population count
// ============================================================================

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitvec/count");
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for nbits in [1 << 10, 1 << 16, 1 << 20] {
        let v = random_vector(&mut rng, nbits);
        group.throughput(Throughput::Bytes((nbits / 8) as u64));
        group.bench_with_input(BenchmarkId::new("count_ones", nbits), &v, |b, v| {
            b.iter(|| black_box(v).count_ones());
        });
        group.bench_with_input(BenchmarkId::new("count_range", nbits), &v, |b, v| {
            b.iter(|| black_box(v).count(true, 3, -5));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Bitwise operators and combined weights
// ============================================================================

fn bench_bitwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitvec/bitwise");

    for nbits in [1 << 10, 1 << 16, 1 << 20] {
        let basis = random_basis(7, 2, nbits);
        group.throughput(Throughput::Bytes((nbits / 8) as u64));
        for op in [Op::And, Op::Or, Op::Xor] {
            group.bench_with_input(BenchmarkId::new(format!("{}_assign", op), nbits), &basis, |b, basis| {
                b.iter(|| {
                    let mut acc = basis[0].clone();
                    acc.bitwise(&basis[1], op).unwrap();
                    acc
                });
            });
            group.bench_with_input(BenchmarkId::new(format!("{}_weight", op), nbits), &basis, |b, basis| {
                b.iter(|| combine_weight(&basis[0], &basis[1], op).unwrap());
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Sub-vector search
// ============================================================================

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitvec/search");
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let haystack = random_vector(&mut rng, 1 << 16);

    for needle_bits in [4, 16, 64] {
        let needle = random_vector(&mut rng, needle_bits);
        group.bench_with_input(BenchmarkId::new("search_all", needle_bits), &needle, |b, needle| {
            b.iter(|| haystack.search_all(needle, None).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Term search (prefix reuse across the odometer)
// ============================================================================

fn bench_term_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("terms/search");
    group.sample_size(10);

    let vectors = random_basis(11, 32, 4096);
    let basis = Basis::new(&vectors).unwrap();
    for degree in [2, 3] {
        let search = TermSearch::default()
            .with_degree(degree)
            .with_op(Op::And)
            .with_top_k(128)
            .with_weight_center(256);
        group.bench_with_input(BenchmarkId::new("m=32,n=4096", degree), &search, |b, search| {
            b.iter(|| search.run(&basis).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Polynomial weights
// ============================================================================

fn bench_polynomials(c: &mut Criterion) {
    let mut group = c.benchmark_group("terms/polynomials");

    let vectors = random_basis(13, 16, 1 << 14);
    let basis = Basis::new(&vectors).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    for count in [1, 16, 64] {
        let polys: Vec<Polynomial> = (0..count)
            .map(|_| {
                (0..4)
                    .map(|_| {
                        let mut mono: Vec<usize> = (0..3).map(|_| rng.random_range(0..16)).collect();
                        mono.sort_unstable();
                        mono.dedup();
                        mono
                    })
                    .collect::<Polynomial>()
            })
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("weights", count), &polys, |b, polys| {
            b.iter(|| basis.eval_polynomials_weight(polys).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_count,
    bench_bitwise,
    bench_search,
    bench_term_search,
    bench_polynomials,
);

criterion_main!(benches);
