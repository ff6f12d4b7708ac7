use thiserror::Error;

use goad_ledger::RecordKind;

/// Failure modes a protocol handler may surface through `connect`/`send`/
/// `poll`. Grouped the way the handler-facing slice of the taxonomy is
/// grouped: network, protocol, timeout, resource. Configuration and
/// integrity errors live outside this crate — they abort before, or are
/// raised well after, any handler call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // -- Network --
    #[error("dns resolution failed")]
    DnsResolutionFailed,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection reset")]
    ConnectionReset,
    #[error("connection closed unexpectedly")]
    ConnectionClosedUnexpectedly,
    #[error("network or host unreachable")]
    HostUnreachable,
    #[error("socket error: {0}")]
    SocketError(String),

    // -- Protocol --
    #[error("invalid response")]
    InvalidResponse,
    #[error("protocol violation")]
    ProtocolViolation,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("invalid header")]
    InvalidHeader,
    #[error("invalid chunked encoding")]
    InvalidChunkedEncoding,
    #[error("content-length mismatch")]
    ContentLengthMismatch,
    #[error("tls handshake failed")]
    TlsHandshakeFailed,
    #[error("certificate invalid")]
    CertificateInvalid,
    #[error("alpn negotiation failed")]
    AlpnNegotiationFailed,

    // -- Timeout --
    #[error("dns timeout")]
    DnsTimeout,
    #[error("connect timeout")]
    ConnectTimeout,
    #[error("tls timeout")]
    TlsTimeout,
    #[error("request timeout")]
    RequestTimeout,
    #[error("read timeout")]
    ReadTimeout,
    #[error("write timeout")]
    WriteTimeout,

    // -- Resource --
    #[error("connection pool exhausted")]
    ConnectionPoolExhausted,
    #[error("file descriptor limit reached")]
    FileDescriptorLimit,
}

impl ProtocolError {
    /// The ledger record kind a scheduler should append for this error.
    ///
    /// Several distinct error variants collapse onto the same `error_*`
    /// ledger record kind, since `RecordKind` is coarser than this
    /// taxonomy.
    #[must_use]
    pub fn ledger_kind(&self) -> RecordKind {
        match self {
            Self::DnsResolutionFailed => RecordKind::ErrorDns,
            Self::ConnectionRefused
            | Self::ConnectionReset
            | Self::ConnectionClosedUnexpectedly
            | Self::HostUnreachable
            | Self::SocketError(_) => RecordKind::ErrorTcp,
            Self::TlsHandshakeFailed | Self::CertificateInvalid | Self::AlpnNegotiationFailed => {
                RecordKind::ErrorTls
            }
            Self::InvalidResponse
            | Self::ProtocolViolation
            | Self::UnsupportedVersion
            | Self::InvalidHeader
            | Self::InvalidChunkedEncoding
            | Self::ContentLengthMismatch => RecordKind::ErrorProtocolViolation,
            Self::DnsTimeout
            | Self::ConnectTimeout
            | Self::TlsTimeout
            | Self::RequestTimeout
            | Self::ReadTimeout
            | Self::WriteTimeout => RecordKind::ErrorTimeout,
            Self::ConnectionPoolExhausted | Self::FileDescriptorLimit => {
                RecordKind::ErrorResourceExhausted
            }
        }
    }

    /// True for kinds whose HTTP-path analogue is "request completed with
    /// an error response" rather than a hard connection failure — kept
    /// here since only the handler can tell them apart.
    #[must_use]
    pub fn is_response_level(&self) -> bool {
        matches!(
            self,
            Self::InvalidResponse
                | Self::ProtocolViolation
                | Self::InvalidHeader
                | Self::InvalidChunkedEncoding
                | Self::ContentLengthMismatch
        )
    }
}
