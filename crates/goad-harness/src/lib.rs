//! End-to-end tooling around the simulation kernel: structured run logging,
//! a run-vs-replay determinism matrix, and in-memory scenario fixtures for
//! a handful of concrete end-to-end cases. The CLI binary in
//! `bin/harness.rs` is the thin surface that makes this crate runnable from
//! the command line; it carries no kernel logic of its own.

#![deny(unsafe_code)]

pub mod assertions;
pub mod conformance_matrix;
pub mod fixtures;
pub mod structured_log;

pub use assertions::{all_passed, evaluate, AssertionOutcome};
pub use conformance_matrix::{
    build_conformance_matrix, check_determinism, run_once, DeterminismCaseRow,
    DeterminismMatrixReport, DeterminismMatrixSummary,
};
pub use structured_log::{
    validate_log_file, validate_log_line, LogEmitter, LogEntry, LogLevel, LogValidationError,
    Milestone, Outcome,
};
