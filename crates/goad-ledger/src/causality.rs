//! Causality invariants over a completed record sequence (P7): a VU's
//! lifecycle records must appear in an order consistent with its state
//! machine, and no response/timeout record may appear for a VU before that
//! VU issued a request.

use std::collections::HashMap;

use crate::error::LedgerError;
use crate::record::{Record, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VuLifecycle {
    Spawned,
    Ready,
    Complete,
}

/// Verify that, per `vu_id`:
/// - lifecycle records appear in the order Spawned -> Ready -> Complete,
///   each at most once, and
/// - no `ResponseReceived` / `ResponseError` / `RequestTimeout` record
///   appears for a VU that has not already recorded a pending
///   `RequestIssued` since its last outcome.
pub fn verify_causality(records: &[Record]) -> Result<(), LedgerError> {
    let mut lifecycle: HashMap<u32, VuLifecycle> = HashMap::new();
    let mut pending_requests: HashMap<u32, u32> = HashMap::new();

    for record in records {
        let vu_id = record.header.vu_id;
        match record.header.kind {
            RecordKind::VuSpawned => match lifecycle.get(&vu_id) {
                None => {
                    lifecycle.insert(vu_id, VuLifecycle::Spawned);
                }
                Some(_) => {
                    return Err(LedgerError::CausalityViolation(format!(
                        "vu {vu_id} spawned more than once"
                    )))
                }
            },
            RecordKind::VuReady => match lifecycle.get(&vu_id) {
                Some(VuLifecycle::Spawned) | Some(VuLifecycle::Ready) => {
                    lifecycle.insert(vu_id, VuLifecycle::Ready);
                }
                _ => {
                    return Err(LedgerError::CausalityViolation(format!(
                        "vu {vu_id} became ready before being spawned"
                    )))
                }
            },
            RecordKind::VuComplete => match lifecycle.get(&vu_id) {
                Some(VuLifecycle::Spawned) | Some(VuLifecycle::Ready) => {
                    lifecycle.insert(vu_id, VuLifecycle::Complete);
                }
                _ => {
                    return Err(LedgerError::CausalityViolation(format!(
                        "vu {vu_id} completed before being spawned"
                    )))
                }
            },
            RecordKind::RequestIssued => {
                *pending_requests.entry(vu_id).or_insert(0) += 1;
            }
            kind if kind.is_request_outcome() => {
                let count = pending_requests.entry(vu_id).or_insert(0);
                if *count == 0 {
                    return Err(LedgerError::CausalityViolation(format!(
                        "vu {vu_id} received a response with no outstanding request"
                    )));
                }
                *count -= 1;
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;

    fn rec(tick: u64, vu_id: u32, kind: RecordKind) -> Record {
        Record::new(tick, vu_id, kind, Payload::zeroed())
    }

    #[test]
    fn well_formed_lifecycle_passes() {
        let records = vec![
            rec(0, 1, RecordKind::VuSpawned),
            rec(1, 1, RecordKind::VuReady),
            rec(2, 1, RecordKind::RequestIssued),
            rec(3, 1, RecordKind::ResponseReceived),
            rec(4, 1, RecordKind::VuComplete),
        ];
        assert!(verify_causality(&records).is_ok());
    }

    #[test]
    fn response_without_request_is_rejected() {
        let records = vec![
            rec(0, 1, RecordKind::VuSpawned),
            rec(1, 1, RecordKind::ResponseReceived),
        ];
        assert!(matches!(
            verify_causality(&records),
            Err(LedgerError::CausalityViolation(_))
        ));
    }

    #[test]
    fn ready_before_spawned_is_rejected() {
        let records = vec![rec(0, 1, RecordKind::VuReady)];
        assert!(matches!(
            verify_causality(&records),
            Err(LedgerError::CausalityViolation(_))
        ));
    }

    #[test]
    fn double_spawn_is_rejected() {
        let records = vec![
            rec(0, 1, RecordKind::VuSpawned),
            rec(1, 1, RecordKind::VuSpawned),
        ];
        assert!(matches!(
            verify_causality(&records),
            Err(LedgerError::CausalityViolation(_))
        ));
    }

    #[test]
    fn independent_vus_do_not_interfere() {
        let records = vec![
            rec(0, 1, RecordKind::VuSpawned),
            rec(0, 2, RecordKind::VuSpawned),
            rec(1, 2, RecordKind::VuReady),
            rec(1, 1, RecordKind::VuReady),
        ];
        assert!(verify_causality(&records).is_ok());
    }
}
