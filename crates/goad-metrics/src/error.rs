//! Error seam for the metrics crate, in the one-enum-per-crate-boundary
//! style used throughout the workspace (see `goad_core::error`).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("value {value} outside histogram range [{low}, {high}]")]
    ValueOutOfRange { value: u64, low: u64, high: u64 },
}
