//! Bounded-memory HDR histogram over nanosecond latencies.
//!
//! A `Histogram<u64>` constructed once with fixed low/high/significant-figures
//! bounds, fed via `record`/`record_n`, read back via `value_at_percentile`.
//! A thin wrapper over the `hdrhistogram` crate rather than a hand-rolled
//! bucket scheme.

use hdrhistogram::Histogram as HdrHistogram;

use crate::error::MetricsError;

/// Lowest latency the histogram can record: 1 nanosecond.
pub const LOWEST_TRACKABLE_NS: u64 = 1;
/// Highest latency the histogram can record: one hour in nanoseconds.
pub const HIGHEST_TRACKABLE_NS: u64 = 3_600_000_000_000;
/// Significant figures of precision retained per bucket.
pub const SIGNIFICANT_FIGURES: u8 = 3;

/// A latency histogram with a fixed memory footprint, independent of how
/// many values get recorded into it.
pub struct Histogram {
    inner: HdrHistogram<u64>,
}

impl Histogram {
    /// Builds a histogram spanning `[1ns, 1hr]` at 3 significant figures.
    #[must_use]
    pub fn new() -> Self {
        let inner = HdrHistogram::new_with_bounds(
            LOWEST_TRACKABLE_NS,
            HIGHEST_TRACKABLE_NS,
            SIGNIFICANT_FIGURES,
        )
        .expect("fixed bounds are always valid for Histogram::new_with_bounds");
        Self { inner }
    }

    /// Records a single occurrence of `value`.
    pub fn record_value(&mut self, value: u64) -> Result<(), MetricsError> {
        self.inner.record(value).map_err(|_| MetricsError::ValueOutOfRange {
            value,
            low: LOWEST_TRACKABLE_NS,
            high: HIGHEST_TRACKABLE_NS,
        })
    }

    /// Records `count` occurrences of `value`. `count == 0` is a no-op.
    pub fn record_values(&mut self, value: u64, count: u64) -> Result<(), MetricsError> {
        if count == 0 {
            return Ok(());
        }
        self.inner
            .record_n(value, count)
            .map_err(|_| MetricsError::ValueOutOfRange {
                value,
                low: LOWEST_TRACKABLE_NS,
                high: HIGHEST_TRACKABLE_NS,
            })
    }

    /// Integer, count-weighted percentile in `[0, 100]`. An empty histogram
    /// returns `0` for every percentile.
    #[must_use]
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        if self.inner.is_empty() {
            return 0;
        }
        self.inner.value_at_percentile(percentile)
    }

    #[must_use]
    pub fn min(&self) -> u64 {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.min()
        }
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.max()
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.inner.mean()
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Zeroes all counters without changing the configured bounds.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
