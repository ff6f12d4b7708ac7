//! Post-run evaluation of a scenario's declarative assertions against the
//! reduced metrics. Never consulted during the run itself — only after the
//! ledger is finalized and reduced, matching the kernel's assertions-are-
//! post-run contract.

use goad_metrics::RunMetrics;
use goad_scheduler::Assertion;

/// One assertion's outcome: the predicate it came from, whether it held,
/// and the observed value formatted for a human-readable report.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionOutcome {
    pub assertion: Assertion,
    pub passed: bool,
    pub observed: String,
}

/// Evaluates every assertion in `assertions` against `metrics`, in order.
/// An empty slice evaluates to an empty, trivially-passing report.
#[must_use]
pub fn evaluate(assertions: &[Assertion], metrics: &RunMetrics) -> Vec<AssertionOutcome> {
    assertions
        .iter()
        .map(|assertion| evaluate_one(*assertion, metrics))
        .collect()
}

/// True iff every assertion in the report passed (including the vacuous
/// case of no assertions at all).
#[must_use]
pub fn all_passed(outcomes: &[AssertionOutcome]) -> bool {
    outcomes.iter().all(|o| o.passed)
}

fn evaluate_one(assertion: Assertion, metrics: &RunMetrics) -> AssertionOutcome {
    match assertion {
        Assertion::P99LatencyUnderMs(limit_ms) => {
            let p99_ms = metrics.latency.p99 as f64 / 1_000_000.0;
            AssertionOutcome {
                assertion,
                passed: p99_ms < limit_ms as f64,
                observed: format!("p99={p99_ms:.3}ms"),
            }
        }
        Assertion::ErrorRateUnder {
            numerator,
            denominator,
        } => {
            let limit = rate(numerator, denominator);
            let observed = metrics.error.error_rate();
            AssertionOutcome {
                assertion,
                passed: observed < limit,
                observed: format!("error_rate={observed:.6}"),
            }
        }
        Assertion::SuccessRateOver {
            numerator,
            denominator,
        } => {
            let limit = rate(numerator, denominator);
            let total = metrics.request.success + metrics.request.failed;
            let observed = if total == 0 {
                0.0
            } else {
                metrics.request.success as f64 / total as f64
            };
            AssertionOutcome {
                assertion,
                passed: observed > limit,
                observed: format!("success_rate={observed:.6}"),
            }
        }
    }
}

fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
