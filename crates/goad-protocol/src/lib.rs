//! Protocol handler capability contract: `connect`/`send`/`poll`/`close`,
//! the request/response/completion types that cross that boundary, and a
//! deterministic scripted handler for tests and fixtures.
//!
//! TCP/TLS mechanics and wire encoding of any real protocol are explicitly
//! outside this crate; it defines the seam a real handler implements, not
//! an implementation of one.

#![deny(unsafe_code)]

pub mod error;
pub mod handler;
pub mod stub;
pub mod types;

pub use error::ProtocolError;
pub use handler::ProtocolHandler;
pub use stub::{ScriptedHandler, ScriptedOutcome, ScriptedResult};
pub use types::{
    Completion, ConnectionId, Method, Outcome, Protocol, Request, RequestId, Response, Target,
};
