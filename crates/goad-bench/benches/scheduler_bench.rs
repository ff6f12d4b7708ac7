//! End-to-end tick-loop throughput: running a full scenario through the
//! scheduler, from spawn to finalized ledger.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use goad_protocol::{Method, ScriptedHandler, ScriptedOutcome};
use goad_scheduler::{
    Metadata, Protocol, RequestSpec, Runtime, ScheduleConfig, ScheduleKind, Scenario,
    SchedulerConfig, TargetConfig,
};

fn scenario(vus: u32) -> Scenario {
    Scenario {
        metadata: Metadata {
            name: "bench".to_string(),
            version: "1".to_string(),
        },
        runtime: Runtime {
            duration_ticks: 5_000,
            vus,
            prng_seed: 42,
            total_steps: 1,
        },
        target: TargetConfig {
            host: "example.test".to_string(),
            port: 443,
            tls: true,
            protocol: Protocol::Http1,
        },
        requests: vec![RequestSpec {
            name: "home".to_string(),
            method: Method::Get,
            path: "/".to_string(),
            header_count: 0,
            body_size: 0,
            timeout_ticks: 50,
            weight: 1,
        }],
        schedule: ScheduleConfig {
            kind: ScheduleKind::Constant,
            parameters: vec![],
        },
        assertions: vec![],
    }
}

fn config(vus: u32) -> SchedulerConfig {
    SchedulerConfig {
        max_vus: vus.max(1),
        max_events: 1_000_000,
        event_queue_capacity: 100_000,
        flush_interval_ticks: 100,
        default_timeout_ticks: 50,
        prng_seed: 42,
        duration_ticks: 5_000,
        max_timeouts_per_step: 3,
        max_connections: vus.max(1),
    }
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_run");
    for &vus in &[10u32, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("vus", vus), &vus, |b, &vus| {
            b.iter(|| {
                let handler = ScriptedHandler::new(
                    vec![ScriptedOutcome::success_after(3, 200, 1_000); vus as usize],
                    vus.max(1),
                );
                let mut scheduler =
                    goad_scheduler::Scheduler::new(config(vus), scenario(vus), handler, 0)
                        .unwrap();
                let mut buf = Vec::new();
                scheduler.run(&mut buf, 0).unwrap();
                criterion::black_box(buf.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_run);
criterion_main!(benches);
