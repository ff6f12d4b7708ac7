//! The capability set the scheduler drives a protocol handler through.
//!
//! Modelled as a compile-time trait bound rather than a trait object: the
//! scheduler is generic over `H: ProtocolHandler`, so a run is monomorphized
//! against exactly the protocol it was built for and there is no dynamic
//! registry to keep deterministic.

use crate::error::ProtocolError;
use crate::types::{Completion, ConnectionId, Request, RequestId, Target};

pub trait ProtocolHandler {
    /// Open a connection to `target`. May suspend internally (e.g. DNS,
    /// TCP handshake) but returns a handle synchronously; the connection is
    /// considered open from the caller's perspective immediately. Must cap
    /// total open connections at the handler's configured limit, returning
    /// [`ProtocolError::ConnectionPoolExhausted`] past it.
    fn connect(&mut self, target: &Target) -> Result<ConnectionId, ProtocolError>;

    /// Issue `request` over `conn_id`. Fire-and-poll: never blocks waiting
    /// for a response, even if the underlying transport would block — in
    /// that case the handler buffers or schedules internally and still
    /// returns a request id.
    fn send(&mut self, conn_id: ConnectionId, request: &Request) -> Result<RequestId, ProtocolError>;

    /// Drain every completion that has become ready since the last call,
    /// appending them to `completions`. Never blocks.
    fn poll(&mut self, completions: &mut Vec<Completion>);

    /// Close `conn_id`. Any requests still outstanding on it are cancelled;
    /// the scheduler will separately time them out.
    fn close(&mut self, conn_id: ConnectionId);
}
