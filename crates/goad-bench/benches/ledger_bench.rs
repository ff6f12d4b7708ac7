//! Ledger append/iterate/verify throughput benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use goad_ledger::{verify_causality, Ledger, LedgerHeader, Payload, Record, RecordKind};

fn header() -> LedgerHeader {
    LedgerHeader {
        prng_seed: 1,
        start_wall_ns: 0,
        scenario_hash: [0u8; 32],
    }
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_append");
    for &n in &[1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("records", n), &n, |b, &n| {
            b.iter(|| {
                let mut ledger = Ledger::new(header(), n);
                for tick in 0..n as u64 {
                    let record = Record::new(tick, 1, RecordKind::RequestIssued, Payload::zeroed());
                    ledger.append(record).unwrap();
                }
                criterion::black_box(ledger.len());
            });
        });
    }
    group.finish();
}

fn bench_iterate_and_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_verify");
    let n = 50_000usize;
    let mut ledger = Ledger::new(header(), n);
    for i in 0..n as u64 {
        let record = Record::new(i, 1, RecordKind::VuSpawned, Payload::zeroed());
        ledger.append(record).unwrap();
    }
    group.bench_function("verify_causality_50k", |b| {
        b.iter(|| {
            let records: Vec<Record> = ledger.iter().copied().collect();
            criterion::black_box(verify_causality(&records).is_ok());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_append, bench_iterate_and_verify);
criterion_main!(benches);
