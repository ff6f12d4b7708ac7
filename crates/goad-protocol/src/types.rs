//! Wire-agnostic request/response/connection types the scheduler and a
//! handler exchange. Nothing here encodes TLS or HTTP framing — that is
//! the handler's own business, out of scope here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque connection handle. `0` is never issued; callers may use it as a
/// "no connection" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

/// Opaque request handle, unique within a run. `0` means "no request" and
/// is used by the VU state machine's `pending_request_id` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// The ASCII method token, at most 8 bytes, matching the ledger
    /// payload's fixed `method[8]` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Http1,
    Http2,
}

/// Connection target. `tls` and `protocol` are carried here rather than
/// negotiated, since negotiation is a handler-internal concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub protocol: Protocol,
}

/// One request a VU may issue, as selected from the scenario's weighted
/// request table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub header_count: u32,
    pub body_size: u32,
    pub timeout_ticks: u64,
}

/// A successfully completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub header_size: u32,
    pub body_size: u32,
    pub latency_ns: u64,
}

impl Response {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// What a request settled to, surfaced by `poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Response(Response),
    Error(crate::error::ProtocolError),
}

/// A single settled request, as drained by `poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request_id: RequestId,
    pub outcome: Outcome,
}
