//! A deterministic, in-process handler used by conformance tests and the
//! harness's fixture scenarios. It never touches a socket: every outcome is
//! scripted ahead of time, so two runs against the same script produce
//! identical completions in identical poll order.

use std::collections::VecDeque;

use crate::error::ProtocolError;
use crate::handler::ProtocolHandler;
use crate::types::{Completion, ConnectionId, Outcome, Request, RequestId, Response, Target};

/// What a scripted request resolves to, and how many `poll` calls after it
/// was sent the resolution becomes visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedOutcome {
    pub delay_polls: u32,
    pub result: ScriptedResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResult {
    Success(Response),
    Failure(ProtocolError),
    /// Never completes; exercises the timeout path.
    Never,
}

impl ScriptedOutcome {
    #[must_use]
    pub fn success_after(delay_polls: u32, status_code: u16, latency_ns: u64) -> Self {
        Self {
            delay_polls,
            result: ScriptedResult::Success(Response {
                status_code,
                header_size: 0,
                body_size: 0,
                latency_ns,
            }),
        }
    }

    #[must_use]
    pub fn never() -> Self {
        Self {
            delay_polls: 0,
            result: ScriptedResult::Never,
        }
    }
}

struct Pending {
    request_id: RequestId,
    ready_at_poll: u64,
    result: ScriptedResult,
}

/// Deterministic stand-in for a real protocol handler.
///
/// Requests are matched to outcomes in the order `send` is called, drawing
/// from a fixed script supplied at construction. Once the script is
/// exhausted, further sends default to [`ScriptedResult::Never`] so a
/// misconfigured fixture hangs visibly (as a timeout) instead of panicking.
pub struct ScriptedHandler {
    script: VecDeque<ScriptedOutcome>,
    max_connections: u32,
    open_connections: u32,
    next_connection_id: u32,
    next_request_id: u32,
    poll_count: u64,
    pending: Vec<Pending>,
}

impl ScriptedHandler {
    #[must_use]
    pub fn new(script: Vec<ScriptedOutcome>, max_connections: u32) -> Self {
        Self {
            script: script.into(),
            max_connections,
            open_connections: 0,
            next_connection_id: 1,
            next_request_id: 1,
            poll_count: 0,
            pending: Vec::new(),
        }
    }
}

impl ProtocolHandler for ScriptedHandler {
    fn connect(&mut self, _target: &Target) -> Result<ConnectionId, ProtocolError> {
        if self.open_connections >= self.max_connections {
            return Err(ProtocolError::ConnectionPoolExhausted);
        }
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        self.open_connections += 1;
        Ok(id)
    }

    fn send(&mut self, _conn_id: ConnectionId, _request: &Request) -> Result<RequestId, ProtocolError> {
        let request_id = RequestId(self.next_request_id);
        self.next_request_id += 1;

        let outcome = self.script.pop_front().unwrap_or_else(ScriptedOutcome::never);
        if !matches!(outcome.result, ScriptedResult::Never) {
            self.pending.push(Pending {
                request_id,
                ready_at_poll: self.poll_count + u64::from(outcome.delay_polls),
                result: outcome.result,
            });
        }
        Ok(request_id)
    }

    fn poll(&mut self, completions: &mut Vec<Completion>) {
        self.poll_count += 1;
        let ready_at = self.poll_count;
        let mut remaining = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if pending.ready_at_poll <= ready_at {
                let outcome = match pending.result {
                    ScriptedResult::Success(response) => Outcome::Response(response),
                    ScriptedResult::Failure(err) => Outcome::Error(err),
                    ScriptedResult::Never => unreachable!("Never outcomes are never queued"),
                };
                completions.push(Completion {
                    request_id: pending.request_id,
                    outcome,
                });
            } else {
                remaining.push(pending);
            }
        }
        self.pending = remaining;
    }

    fn close(&mut self, _conn_id: ConnectionId) {
        self.open_connections = self.open_connections.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Method, Protocol};

    fn target() -> Target {
        Target {
            host: "example.test".to_string(),
            port: 80,
            tls: false,
            protocol: Protocol::Http1,
        }
    }

    fn request() -> Request {
        Request {
            method: Method::Get,
            path: "/".to_string(),
            header_count: 0,
            body_size: 0,
            timeout_ticks: 50,
        }
    }

    #[test]
    fn connect_caps_at_max_connections() {
        let mut handler = ScriptedHandler::new(vec![], 1);
        handler.connect(&target()).unwrap();
        assert!(matches!(
            handler.connect(&target()),
            Err(ProtocolError::ConnectionPoolExhausted)
        ));
    }

    #[test]
    fn scripted_success_arrives_after_delay() {
        let mut handler =
            ScriptedHandler::new(vec![ScriptedOutcome::success_after(2, 200, 123)], 4);
        let conn = handler.connect(&target()).unwrap();
        let req = handler.send(conn, &request()).unwrap();

        let mut completions = Vec::new();
        handler.poll(&mut completions);
        assert!(completions.is_empty());
        handler.poll(&mut completions);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].request_id, req);
        match &completions[0].outcome {
            Outcome::Response(r) => assert_eq!(r.status_code, 200),
            Outcome::Error(_) => panic!("expected success"),
        }
    }

    #[test]
    fn never_outcome_produces_no_completion() {
        let mut handler = ScriptedHandler::new(vec![ScriptedOutcome::never()], 4);
        let conn = handler.connect(&target()).unwrap();
        handler.send(conn, &request()).unwrap();
        let mut completions = Vec::new();
        for _ in 0..10 {
            handler.poll(&mut completions);
        }
        assert!(completions.is_empty());
    }

    #[test]
    fn exhausted_script_defaults_to_never() {
        let mut handler = ScriptedHandler::new(vec![], 4);
        let conn = handler.connect(&target()).unwrap();
        handler.send(conn, &request()).unwrap();
        let mut completions = Vec::new();
        handler.poll(&mut completions);
        assert!(completions.is_empty());
    }
}
