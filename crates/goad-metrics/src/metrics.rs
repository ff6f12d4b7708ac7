//! Single-pass reduction of a ledger into request/latency/throughput/
//! connection/error summary structs.
//!
//! The reducer never looks at a record twice and never sorts the ledger: it
//! walks records in stored (tick, sequence) order and folds each into the
//! relevant accumulator, mirroring the "one pass, exact counts" requirement.

use std::collections::BTreeMap;

use goad_ledger::{
    ConnEstablishedPayload, ErrorPayload, Ledger, Record, RecordKind, RequestIssuedPayload,
    ResponseReceivedPayload,
};

use crate::error::MetricsError;
use crate::histogram::Histogram;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetrics {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub by_method: BTreeMap<String, u64>,
    pub by_status_class: BTreeMap<u16, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatencyMetrics {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
    pub sample_count: u64,
}

impl LatencyMetrics {
    fn from_histogram(histogram: &Histogram) -> Self {
        Self {
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            p50: histogram.value_at_percentile(50.0),
            p90: histogram.value_at_percentile(90.0),
            p95: histogram.value_at_percentile(95.0),
            p99: histogram.value_at_percentile(99.0),
            p999: histogram.value_at_percentile(99.9),
            sample_count: histogram.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThroughputMetrics {
    pub response_count: u64,
    pub total_duration_ticks: u64,
    pub requests_per_tick: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectionMetrics {
    pub total: u64,
    pub errors: u64,
    pub avg_connection_time_ns: f64,
    pub reused: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMetrics {
    pub total: u64,
    /// Numerator/denominator pair rather than a bare `f64`, so a zero-sample
    /// run reports `0/0` instead of a NaN rate.
    pub error_rate_numerator: u64,
    pub error_rate_denominator: u64,
    pub per_kind: BTreeMap<String, u64>,
}

impl ErrorMetrics {
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.error_rate_denominator == 0 {
            0.0
        } else {
            self.error_rate_numerator as f64 / self.error_rate_denominator as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub request: RequestMetrics,
    pub latency: LatencyMetrics,
    pub throughput: ThroughputMetrics,
    pub connection: ConnectionMetrics,
    pub error: ErrorMetrics,
    pub start_tick: u64,
    pub end_tick: u64,
}

/// Accumulates records, fold-style, into the five metrics structs. `Ledger`
/// and `ReadLedger` both expose their records as `&[Record]`/an iterator, so
/// this takes anything that can hand back `&Record` one at a time.
pub struct Reducer {
    request: RequestMetrics,
    histogram: Histogram,
    response_count: u64,
    connection: ConnectionMetrics,
    connection_time_total_ns: u128,
    error: ErrorMetrics,
    start_tick: Option<u64>,
    end_tick: Option<u64>,
    seen_connections: BTreeMap<u32, ()>,
}

impl Reducer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request: RequestMetrics::default(),
            histogram: Histogram::new(),
            response_count: 0,
            connection: ConnectionMetrics::default(),
            connection_time_total_ns: 0,
            error: ErrorMetrics::default(),
            start_tick: None,
            end_tick: None,
            seen_connections: BTreeMap::new(),
        }
    }

    fn observe_tick(&mut self, tick: u64) {
        self.start_tick = Some(self.start_tick.map_or(tick, |min| min.min(tick)));
        self.end_tick = Some(self.end_tick.map_or(tick, |max| max.max(tick)));
    }

    /// Folds one record into the accumulators. Returns an error only if a
    /// latency value recorded by the handler falls outside the histogram's
    /// configured range — every other record kind is infallible to fold.
    pub fn observe(&mut self, record: &Record) -> Result<(), MetricsError> {
        self.observe_tick(record.header.tick);
        match record.header.kind {
            RecordKind::RequestIssued => {
                let payload = RequestIssuedPayload::decode(&record.payload);
                self.request.total += 1;
                *self
                    .request
                    .by_method
                    .entry(method_label(&payload.method))
                    .or_insert(0) += 1;
            }
            RecordKind::ResponseReceived => {
                let payload = ResponseReceivedPayload::decode(&record.payload);
                self.response_count += 1;
                self.histogram.record_value(payload.latency_ns)?;
                let class = u16::from(payload.status_code) / 100;
                *self.request.by_status_class.entry(class).or_insert(0) += 1;
                if payload.status_code < 400 {
                    self.request.success += 1;
                } else {
                    self.request.failed += 1;
                }
            }
            RecordKind::ResponseError => {
                let payload = ErrorPayload::decode(&record.payload);
                self.request.failed += 1;
                self.error.total += 1;
                *self
                    .error
                    .per_kind
                    .entry("response_error".to_string())
                    .or_insert(0) += 1;
                let _ = payload.request_id;
            }
            RecordKind::RequestTimeout => {
                self.request.failed += 1;
                self.error.total += 1;
                *self
                    .error
                    .per_kind
                    .entry("timeout".to_string())
                    .or_insert(0) += 1;
            }
            kind if is_error_kind(kind) => {
                self.request.failed += 1;
                self.error.total += 1;
                *self.error.per_kind.entry(error_label(kind)).or_insert(0) += 1;
            }
            RecordKind::ConnEstablished => {
                let payload = ConnEstablishedPayload::decode(&record.payload);
                self.connection.total += 1;
                self.connection_time_total_ns += u128::from(payload.conn_time_ns);
                if self.seen_connections.insert(payload.conn_id, ()).is_some() {
                    self.connection.reused += 1;
                }
            }
            RecordKind::ConnError => {
                self.connection.errors += 1;
            }
            _ => {}
        }
        Ok(())
    }

    /// Consumes the accumulator and computes the derived summary structs:
    /// percentiles, means, and rates.
    #[must_use]
    pub fn finish(mut self) -> RunMetrics {
        let start_tick = self.start_tick.unwrap_or(0);
        let end_tick = self.end_tick.unwrap_or(0);
        let duration = end_tick.saturating_sub(start_tick);

        self.error.error_rate_numerator = self.error.total;
        self.error.error_rate_denominator = self.request.success + self.request.failed;

        self.connection.avg_connection_time_ns = if self.connection.total == 0 {
            0.0
        } else {
            self.connection_time_total_ns as f64 / self.connection.total as f64
        };

        let throughput = ThroughputMetrics {
            response_count: self.response_count,
            total_duration_ticks: duration,
            requests_per_tick: if duration == 0 {
                0.0
            } else {
                self.response_count as f64 / duration as f64
            },
        };

        RunMetrics {
            latency: LatencyMetrics::from_histogram(&self.histogram),
            request: self.request,
            throughput,
            connection: self.connection,
            error: self.error,
            start_tick,
            end_tick,
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}

fn method_label(raw: &[u8; 8]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

fn is_error_kind(kind: RecordKind) -> bool {
    matches!(
        kind,
        RecordKind::ErrorDns
            | RecordKind::ErrorTcp
            | RecordKind::ErrorTls
            | RecordKind::ErrorHttp
            | RecordKind::ErrorTimeout
            | RecordKind::ErrorProtocolViolation
            | RecordKind::ErrorResourceExhausted
    )
}

fn error_label(kind: RecordKind) -> String {
    match kind {
        RecordKind::ErrorDns => "dns",
        RecordKind::ErrorTcp => "tcp",
        RecordKind::ErrorTls => "tls",
        RecordKind::ErrorHttp => "http",
        RecordKind::ErrorTimeout => "timeout",
        RecordKind::ErrorProtocolViolation => "protocol_violation",
        RecordKind::ErrorResourceExhausted => "resource_exhausted",
        _ => "other",
    }
    .to_string()
}

/// Reduces every record in `ledger` into a `RunMetrics` in a single pass.
pub fn reduce(ledger: &Ledger) -> Result<RunMetrics, MetricsError> {
    let mut reducer = Reducer::new();
    for record in ledger.iter() {
        reducer.observe(record)?;
    }
    Ok(reducer.finish())
}

/// Same as [`reduce`], for callers holding a bare record slice (e.g. a
/// replayed `ReadLedger`) rather than a live `Ledger`.
pub fn reduce_records(records: &[Record]) -> Result<RunMetrics, MetricsError> {
    let mut reducer = Reducer::new();
    for record in records {
        reducer.observe(record)?;
    }
    Ok(reducer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goad_ledger::{LedgerHeader, Payload};

    fn header(tick: u64, vu_id: u32, kind: RecordKind, payload: Payload) -> Record {
        Record::new(tick, vu_id, kind, payload)
    }

    fn fresh_ledger(capacity: usize) -> Ledger {
        Ledger::new(
            LedgerHeader {
                prng_seed: 1,
                start_wall_ns: 0,
                scenario_hash: [0u8; 32],
            },
            capacity,
        )
    }

    #[test]
    fn empty_ledger_reduces_to_zeroed_metrics() {
        let ledger = fresh_ledger(8);
        let metrics = reduce(&ledger).unwrap();
        assert_eq!(metrics.request.total, 0);
        assert_eq!(metrics.request.success, 0);
        assert_eq!(metrics.request.failed, 0);
        assert_eq!(metrics.error.error_rate(), 0.0);
        assert_eq!(metrics.throughput.requests_per_tick, 0.0);
        assert_eq!(metrics.latency.sample_count, 0);
    }

    #[test]
    fn single_request_success_lifecycle() {
        let mut ledger = fresh_ledger(8);
        ledger
            .append(header(
                0,
                1,
                RecordKind::RequestIssued,
                RequestIssuedPayload {
                    request_id: 1,
                    method: *b"GET\0\0\0\0\0",
                    url_hash: 0,
                    header_count: 0,
                    body_size: 0,
                }
                .encode(),
            ))
            .unwrap();
        ledger
            .append(header(
                50,
                1,
                RecordKind::ResponseReceived,
                ResponseReceivedPayload {
                    request_id: 1,
                    status_code: 200,
                    header_size: 0,
                    body_size: 0,
                    latency_ns: 1_000,
                }
                .encode(),
            ))
            .unwrap();

        let metrics = reduce(&ledger).unwrap();
        assert_eq!(metrics.request.total, 1);
        assert_eq!(metrics.request.success, 1);
        assert_eq!(metrics.request.failed, 0);
        assert_eq!(metrics.request.by_method.get("GET"), Some(&1));
        assert_eq!(metrics.request.by_status_class.get(&2), Some(&1));
        assert_eq!(metrics.latency.sample_count, 1);
        assert_eq!(metrics.start_tick, 0);
        assert_eq!(metrics.end_tick, 50);
    }

    #[test]
    fn percentile_accuracy_over_reduced_histogram() {
        let mut reducer = Reducer::new();
        for v in 1..=100u64 {
            reducer
                .observe(&header(
                    0,
                    1,
                    RecordKind::ResponseReceived,
                    ResponseReceivedPayload {
                        request_id: v,
                        status_code: 200,
                        header_size: 0,
                        body_size: 0,
                        latency_ns: v,
                    }
                    .encode(),
                ))
                .unwrap();
        }
        let metrics = reducer.finish();
        assert_eq!(metrics.latency.sample_count, 100);
        assert_eq!(metrics.latency.min, 1);
        assert_eq!(metrics.latency.max, 100);
        assert!((49..=51).contains(&metrics.latency.p50));
        assert!((98..=100).contains(&metrics.latency.p99));
    }

    #[test]
    fn error_records_count_as_failed() {
        let mut ledger = fresh_ledger(8);
        ledger
            .append(header(
                3,
                2,
                RecordKind::ErrorTimeout,
                ErrorPayload::new(7, "connect timed out").encode(),
            ))
            .unwrap();
        let metrics = reduce(&ledger).unwrap();
        assert_eq!(metrics.request.failed, 1);
        assert_eq!(metrics.error.total, 1);
        assert_eq!(metrics.error.per_kind.get("timeout"), Some(&1));
        assert_eq!(metrics.error.error_rate(), 1.0);
    }

    #[test]
    fn connection_established_accumulates_count_and_time() {
        let mut ledger = fresh_ledger(8);
        ledger
            .append(header(
                0,
                1,
                RecordKind::ConnEstablished,
                ConnEstablishedPayload {
                    conn_id: 9,
                    remote_addr_hash: 0,
                    protocol: 1,
                    tls_flag: true,
                    conn_time_ns: 200,
                }
                .encode(),
            ))
            .unwrap();
        let metrics = reduce(&ledger).unwrap();
        assert_eq!(metrics.connection.total, 1);
        assert_eq!(metrics.connection.avg_connection_time_ns, 200.0);
    }
}
