//! Scheduler configuration. A plain struct with no environment-variable
//! resolution: determinism forbids any run-time input besides the scenario
//! and seed, so this never consults the process environment.

use crate::error::ConfigError;

pub const MAX_VUS_CEILING: u32 = 100_000;
pub const MAX_EVENTS_CEILING: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_vus: u32,
    /// Bounds the ledger's total record count. Exceeding it triggers the
    /// event-log-full backpressure abort.
    pub max_events: usize,
    /// Bounds the scheduler's internal, non-persisted event queue — a
    /// distinct resource from the ledger's record count, since a run can
    /// have many in-flight timeouts pending without yet having appended a
    /// record for each.
    pub event_queue_capacity: usize,
    pub flush_interval_ticks: u64,
    pub default_timeout_ticks: u64,
    pub prng_seed: u64,
    pub duration_ticks: u64,
    /// Open question #2: bounds repeated timeouts on the same scenario
    /// step before the VU is forced to `COMPLETE` instead of returning to
    /// `READY`.
    pub max_timeouts_per_step: u32,
    /// Caps the number of simultaneously open connections the scheduler
    /// will admit; a VU requesting a new connection past this limit is
    /// treated the same as a handler-reported pool-exhaustion retry.
    pub max_connections: u32,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_vus > MAX_VUS_CEILING {
            return Err(ConfigError::TooManyVus {
                requested: self.max_vus,
                ceiling: MAX_VUS_CEILING,
            });
        }
        if self.max_events > MAX_EVENTS_CEILING {
            return Err(ConfigError::TooManyEvents {
                requested: self.max_events,
                ceiling: MAX_EVENTS_CEILING,
            });
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_vus: 1_000,
            max_events: 10_000,
            event_queue_capacity: 4_096,
            flush_interval_ticks: 100,
            default_timeout_ticks: 50,
            prng_seed: 0,
            duration_ticks: 1_000,
            max_timeouts_per_step: 3,
            max_connections: 256,
        }
    }
}
