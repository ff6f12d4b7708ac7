//! The logical-tick scheduler: owns the VU cohort, the bounded event queue,
//! the ledger, and the PRNG, and drives them through the five-step loop
//! fixed by the governing design (timed events, cohort activation, handler
//! poll, tick advance, periodic flush) against a compile-time-selected
//! protocol handler.
//!
//! This crate also carries the read-only scenario projection (`scenario`)
//! the scheduler consumes — parsing a scenario file is explicitly someone
//! else's job, so the shapes here are the contract a loader hands over, not
//! a parser.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod scenario;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::{ConfigError, ResourceError, SchedulerError};
pub use events::ScheduledEvent;
pub use scenario::{
    Assertion, Metadata, Protocol, RequestSpec, Runtime, ScheduleConfig, ScheduleKind, Scenario,
    TargetConfig,
};
pub use scheduler::Scheduler;
