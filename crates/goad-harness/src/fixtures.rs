//! In-memory `Scenario` + handler-script builders for a handful of concrete
//! end-to-end scenarios (null run, single successful request, deterministic
//! replay, timeout handling, backpressure).
//!
//! Each builder returns ready-to-run inputs rather than loading them from
//! disk, since `goad-scheduler::scenario::Scenario` is the serde-backed,
//! JSON round-trippable shape an external loader is expected to hand over;
//! these functions stand in for that loader in tests.

use goad_protocol::{Method, ScriptedHandler, ScriptedOutcome};
use goad_scheduler::{
    Assertion, Metadata, Protocol, RequestSpec, Runtime, ScheduleConfig, ScheduleKind, Scenario,
    SchedulerConfig, TargetConfig,
};

fn base_request(timeout_ticks: u64) -> RequestSpec {
    RequestSpec {
        name: "home".to_string(),
        method: Method::Get,
        path: "/".to_string(),
        header_count: 0,
        body_size: 0,
        timeout_ticks,
        weight: 1,
    }
}

fn base_target() -> TargetConfig {
    TargetConfig {
        host: "example.test".to_string(),
        port: 443,
        tls: true,
        protocol: Protocol::Http1,
    }
}

/// Scenario 1: no VUs, nothing should ever be scheduled or recorded.
#[must_use]
pub fn null_run() -> (Scenario, SchedulerConfig) {
    let scenario = Scenario {
        metadata: Metadata {
            name: "null_run".to_string(),
            version: "1".to_string(),
        },
        runtime: Runtime {
            duration_ticks: 10,
            vus: 0,
            prng_seed: 1,
            total_steps: 1,
        },
        target: base_target(),
        requests: vec![base_request(50)],
        schedule: ScheduleConfig {
            kind: ScheduleKind::Constant,
            parameters: vec![],
        },
        assertions: vec![],
    };
    (scenario, SchedulerConfig::default())
}

/// Scenario 2/3: one VU, one request, a scripted handler that answers `200`
/// after 50 polls. Used standalone for scenario 2 and run twice under the
/// same seed for scenario 3's replay check.
#[must_use]
pub fn single_request_success() -> (Scenario, SchedulerConfig, ScriptedHandler) {
    let scenario = Scenario {
        metadata: Metadata {
            name: "single_request_success".to_string(),
            version: "1".to_string(),
        },
        runtime: Runtime {
            duration_ticks: 100,
            vus: 1,
            prng_seed: 42,
            total_steps: 1,
        },
        target: base_target(),
        requests: vec![base_request(90)],
        schedule: ScheduleConfig {
            kind: ScheduleKind::Constant,
            parameters: vec![],
        },
        assertions: vec![Assertion::SuccessRateOver {
            numerator: 1,
            denominator: 1,
        }],
    };
    let mut config = SchedulerConfig {
        prng_seed: 42,
        duration_ticks: 100,
        ..SchedulerConfig::default()
    };
    config.max_vus = 1;
    let handler = ScriptedHandler::new(
        vec![ScriptedOutcome::success_after(50, 200, 1_000_000)],
        4,
    );
    (scenario, config, handler)
}

/// Scenario 4: one VU, a request with a tight timeout, and a handler that
/// never answers — exercises the `WAITING → READY`/`COMPLETE` timeout path.
#[must_use]
pub fn timeout_semantics() -> (Scenario, SchedulerConfig, ScriptedHandler) {
    let scenario = Scenario {
        metadata: Metadata {
            name: "timeout_semantics".to_string(),
            version: "1".to_string(),
        },
        runtime: Runtime {
            duration_ticks: 100,
            vus: 1,
            prng_seed: 7,
            total_steps: 1,
        },
        target: base_target(),
        requests: vec![base_request(5)],
        schedule: ScheduleConfig {
            kind: ScheduleKind::Constant,
            parameters: vec![],
        },
        assertions: vec![],
    };
    let config = SchedulerConfig {
        prng_seed: 7,
        duration_ticks: 100,
        max_timeouts_per_step: 3,
        ..SchedulerConfig::default()
    };
    let handler = ScriptedHandler::new(vec![ScriptedOutcome::never()], 4);
    (scenario, config, handler)
}

/// Scenario 6: a ledger capacity small enough that a sustained request rate
/// exhausts it well before the run would otherwise finish.
#[must_use]
pub fn backpressure_abort() -> (Scenario, SchedulerConfig, ScriptedHandler) {
    let scenario = Scenario {
        metadata: Metadata {
            name: "backpressure_abort".to_string(),
            version: "1".to_string(),
        },
        runtime: Runtime {
            duration_ticks: 10_000,
            vus: 8,
            prng_seed: 99,
            total_steps: 1_000,
        },
        target: base_target(),
        requests: vec![base_request(5)],
        schedule: ScheduleConfig {
            kind: ScheduleKind::Constant,
            parameters: vec![],
        },
        assertions: vec![],
    };
    let config = SchedulerConfig {
        prng_seed: 99,
        duration_ticks: 10_000,
        max_events: 64,
        event_queue_capacity: 64,
        ..SchedulerConfig::default()
    };
    let script = (0..10_000)
        .map(|i| ScriptedOutcome::success_after(1, 200, u64::from(i) + 1))
        .collect();
    let handler = ScriptedHandler::new(script, 16);
    (scenario, config, handler)
}
