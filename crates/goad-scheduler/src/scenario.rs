//! Read-only projection of the external scenario loader's output.
//!
//! Parsing scenario files is explicitly someone else's job; this crate only
//! defines the shape the loader is expected to hand over and the
//! `scenario_hash` derivation the ledger header records.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use goad_protocol::Method;
pub use goad_protocol::Protocol;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub duration_ticks: u32,
    pub vus: u32,
    /// `0` means "derive from entropy" at the loader level; by the time a
    /// `Scenario` reaches the scheduler this has already been resolved to
    /// the seed actually used, which is what gets recorded in the ledger
    /// header.
    pub prng_seed: u64,
    /// Number of request/response steps a VU runs through before it
    /// transitions to `COMPLETE`.
    pub total_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub header_count: u32,
    pub body_size: u32,
    pub timeout_ticks: u64,
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleKind {
    Constant,
    Ramp,
    Spike,
    Steps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub kind: ScheduleKind,
    /// Opaque to the scheduler beyond the ramp/spike/steps shape it names;
    /// interpreted by whichever cohort-admission policy honors it.
    pub parameters: Vec<(String, u64)>,
}

/// A declarative predicate evaluated once, post-run, against the reduced
/// metrics. Never consulted during the run itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assertion {
    P99LatencyUnderMs(u64),
    ErrorRateUnder { numerator: u64, denominator: u64 },
    SuccessRateOver { numerator: u64, denominator: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub metadata: Metadata,
    pub runtime: Runtime,
    pub target: TargetConfig,
    pub requests: Vec<RequestSpec>,
    pub schedule: ScheduleConfig,
    pub assertions: Vec<Assertion>,
}

impl Scenario {
    /// SHA-256 over the fields that define a run's identity, independent of
    /// the seed actually used (the seed is recorded separately in the
    /// ledger header). Two scenarios that differ only in, say, an assertion
    /// threshold still hash differently, since assertions are part of what
    /// the scenario asserts about itself.
    #[must_use]
    pub fn scenario_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.metadata.name.as_bytes());
        hasher.update(self.metadata.version.as_bytes());
        hasher.update(self.runtime.duration_ticks.to_le_bytes());
        hasher.update(self.runtime.vus.to_le_bytes());
        hasher.update(self.target.host.as_bytes());
        hasher.update(self.target.port.to_le_bytes());
        hasher.update([u8::from(self.target.tls)]);
        for request in &self.requests {
            hasher.update(request.name.as_bytes());
            hasher.update(request.method.as_str().as_bytes());
            hasher.update(request.path.as_bytes());
            hasher.update(request.weight.to_le_bytes());
            hasher.update(request.timeout_ticks.to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Total weight across all requests; `0` iff every request has zero
    /// weight (a configuration error the scheduler refuses to start with).
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.requests.iter().map(|r| u64::from(r.weight)).sum()
    }
}
