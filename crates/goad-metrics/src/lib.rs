//! Post-run metrics reducer: a single pass over a ledger's records into the
//! summary structs a formatter or assertion check consumes. Never stored in
//! the ledger itself — always derived, and always reproducible from the
//! ledger bytes alone.

#![deny(unsafe_code)]

pub mod error;
pub mod histogram;
pub mod metrics;

pub use error::MetricsError;
pub use histogram::Histogram;
pub use metrics::{
    reduce, reduce_records, ConnectionMetrics, ErrorMetrics, LatencyMetrics, Reducer,
    RequestMetrics, RunMetrics, ThroughputMetrics,
};
