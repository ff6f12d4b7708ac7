//! Run-vs-replay determinism matrix.
//!
//! Each row runs the same scenario and seed through two independent handler
//! instances and checks the two resulting ledgers are byte-identical, the
//! row/matrix aggregation shape standing in for a differential test report.

use std::io::Cursor;

use goad_ledger::read_from;
use goad_protocol::ProtocolHandler;
use goad_scheduler::{Scenario, Scheduler, SchedulerConfig, SchedulerError};

/// Outcome of one scenario run through the determinism check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismCaseRow {
    pub name: String,
    pub byte_equal: bool,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterminismMatrixSummary {
    pub total: usize,
    pub passed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismMatrixReport {
    pub rows: Vec<DeterminismCaseRow>,
    pub summary: DeterminismMatrixSummary,
}

impl DeterminismMatrixReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.summary.passed == self.summary.total
    }
}

/// Runs a scenario to completion through `handler`, returning the finalized
/// ledger bytes.
pub fn run_once<H: ProtocolHandler>(
    scenario: Scenario,
    config: SchedulerConfig,
    handler: H,
    start_wall_ns: u64,
) -> Result<Vec<u8>, SchedulerError> {
    let mut scheduler = Scheduler::new(config, scenario, handler, start_wall_ns)?;
    let mut buf = Vec::new();
    scheduler.run(&mut buf, start_wall_ns)?;
    Ok(buf)
}

/// Runs the same scenario/seed through two handler instances and checks the
/// resulting ledgers for byte equality.
pub fn check_determinism<H: ProtocolHandler>(
    name: &str,
    scenario: Scenario,
    config: SchedulerConfig,
    handler_a: H,
    handler_b: H,
) -> Result<DeterminismCaseRow, SchedulerError> {
    let bytes_a = run_once(scenario.clone(), config, handler_a, 0)?;
    let bytes_b = run_once(scenario, config, handler_b, 0)?;
    let byte_equal = bytes_a == bytes_b;
    let record_count = read_from(&mut Cursor::new(&bytes_a))
        .map(|read| read.records.len())
        .unwrap_or(0);
    Ok(DeterminismCaseRow {
        name: name.to_string(),
        byte_equal,
        record_count,
    })
}

/// Builds a summary report across several determinism cases, each already
/// evaluated via [`check_determinism`].
#[must_use]
pub fn build_conformance_matrix(rows: Vec<DeterminismCaseRow>) -> DeterminismMatrixReport {
    let total = rows.len();
    let passed = rows.iter().filter(|r| r.byte_equal).count();
    DeterminismMatrixReport {
        rows,
        summary: DeterminismMatrixSummary { total, passed },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn single_request_success_replays_byte_identically() {
        let (scenario, config, _) = fixtures::single_request_success();
        let handler_a = goad_protocol::ScriptedHandler::new(
            vec![goad_protocol::ScriptedOutcome::success_after(50, 200, 1_000_000)],
            4,
        );
        let handler_b = goad_protocol::ScriptedHandler::new(
            vec![goad_protocol::ScriptedOutcome::success_after(50, 200, 1_000_000)],
            4,
        );
        let row =
            check_determinism("single_request_success", scenario, config, handler_a, handler_b)
                .unwrap();
        assert!(row.byte_equal);
        assert!(row.record_count > 0);
    }

    #[test]
    fn matrix_summary_counts_pass_and_total() {
        let rows = vec![
            DeterminismCaseRow {
                name: "a".to_string(),
                byte_equal: true,
                record_count: 5,
            },
            DeterminismCaseRow {
                name: "b".to_string(),
                byte_equal: false,
                record_count: 5,
            },
        ];
        let report = build_conformance_matrix(rows);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 1);
        assert!(!report.all_passed());
    }
}
