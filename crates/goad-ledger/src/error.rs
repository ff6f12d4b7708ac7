use thiserror::Error;

/// Failure modes for ledger append, persistence, and verification.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger is full at capacity {capacity}")]
    LogFull { capacity: usize },
    #[error("record {index} failed its CRC-64 checksum")]
    ChecksumMismatch { index: usize },
    #[error("record {index} violates total order (tick, vu_id, sequence)")]
    OrderingViolation { index: usize },
    #[error("causality violation: {0}")]
    CausalityViolation(String),
    #[error("ledger file has wrong magic number")]
    BadMagic,
    #[error("unsupported ledger version {0}")]
    UnsupportedVersion(u16),
    #[error("ledger file is truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("unknown record kind {0}")]
    UnknownKind(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
