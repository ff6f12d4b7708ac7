use thiserror::Error;

use goad_core::error::{BudgetError, QueueError};
use goad_ledger::LedgerError;
use goad_protocol::ProtocolError;

/// Configuration errors abort startup before any record is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("vus {requested} exceeds the hard ceiling of {ceiling}")]
    TooManyVus { requested: u32, ceiling: u32 },
    #[error("max_events {requested} exceeds the hard ceiling of {ceiling}")]
    TooManyEvents { requested: usize, ceiling: usize },
    #[error("memory budget check failed at startup: need {needed}, have {available}")]
    InsufficientBudget { needed: usize, available: usize },
    #[error("scenario has no requests with nonzero weight")]
    AllWeightsZero,
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Resource errors raised mid-run: either handled as backpressure by the
/// scheduler loop, or surfaced here to force an abort.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("event log is full")]
    EventLogFull,
    #[error("memory budget exceeded")]
    MemoryBudgetExceeded,
}

/// Top-level scheduler error, composing configuration/resource failures
/// with whatever the ledger or handler surfaced.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("event queue error: {0}")]
    EventQueue(#[from] QueueError),
    #[error("memory budget error: {0}")]
    Budget(#[from] BudgetError),
}
