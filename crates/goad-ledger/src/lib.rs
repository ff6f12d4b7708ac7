//! Append-only, checksummed binary event ledger.
//!
//! A run produces exactly one ledger: a 64-byte header, a sequence of
//! 272-byte records each guarded by its own CRC-64, and a 64-byte footer
//! carrying a SHA-256 over the header and every record byte. Replaying a
//! ledger and re-deriving the same footer hash is how determinism (P2) gets
//! checked after the fact.

#![deny(unsafe_code)]

pub mod causality;
pub mod crc;
pub mod error;
pub mod ledger;
pub mod record;

pub use causality::verify_causality;
pub use error::LedgerError;
pub use ledger::{read_from, Ledger, LedgerFooter, LedgerHeader, ReadLedger};
pub use record::{
    ConnEstablishedPayload, ErrorPayload, Payload, Record, RecordHeader, RecordKind,
    RequestIssuedPayload, ResponseReceivedPayload, RECORD_SIZE,
};
