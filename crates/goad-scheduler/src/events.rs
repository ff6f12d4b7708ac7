//! Scheduled event payloads carried by the event queue. Not persisted —
//! distinct from ledger records, which are the durable record of what the
//! queue caused to happen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Spawn VU `vu_id` at this tick.
    Spawn { vu_id: u32 },
    /// Fire a timeout for `request_id` owned by `vu_id`, scheduled when the
    /// request was issued. Dropped silently if the VU's
    /// `pending_request_id` no longer matches `request_id` (the response
    /// already arrived).
    Timeout { vu_id: u32, request_id: u32 },
    /// Retry `vu_id`'s send after a backpressure delay.
    Retry { vu_id: u32 },
}
