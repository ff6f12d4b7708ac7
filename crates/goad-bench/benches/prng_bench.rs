//! PRNG throughput benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use goad_core::prng::Prng;

fn bench_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("prng_next");
    group.bench_function("1000_draws", |b| {
        b.iter(|| {
            let mut prng = Prng::new(42);
            let mut acc = 0u64;
            for _ in 0..1000 {
                acc ^= prng.next();
            }
            criterion::black_box(acc);
        });
    });
    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("prng_range");
    for &max in &[2u64, 16, 256, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("draws", max), &max, |b, &max| {
            b.iter(|| {
                let mut prng = Prng::new(7);
                let mut acc = 0u64;
                for _ in 0..1000 {
                    acc ^= prng.range(max).unwrap();
                }
                criterion::black_box(acc);
            });
        });
    }
    group.finish();
}

fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("prng_shuffle");
    for &len in &[16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::new("len", len), &len, |b, &len| {
            let mut data: Vec<u32> = (0..len as u32).collect();
            b.iter(|| {
                let mut prng = Prng::new(11);
                prng.shuffle(&mut data);
                criterion::black_box(&data);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next, bench_range, bench_shuffle);
criterion_main!(benches);
