use crate::measurement::Measurement;
use crate::operation::{Operation, OperationMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Percentiles reported for every operation, in percent
pub const PERCENTILES: [usize; 7] = [10, 25, 50, 75, 90, 95, 99];

/// Lower and upper index bounds (percent) of the mid-range average
pub const MID_AVG_RANGE: (usize, usize) = (10, 90);

/// Derived latency statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    AvgLatency,
    MidAvgLatency,
    MinLatency,
    P10Latency,
    P25Latency,
    MedianLatency,
    P75Latency,
    P90Latency,
    P95Latency,
    P99Latency,
    MaxLatency,
    MaxThreadLatencySum,
}

impl Metric {
    pub const COUNT: usize = 12;

    /// All metrics in report column order
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::AvgLatency,
        Metric::MidAvgLatency,
        Metric::MinLatency,
        Metric::P10Latency,
        Metric::P25Latency,
        Metric::MedianLatency,
        Metric::P75Latency,
        Metric::P90Latency,
        Metric::P95Latency,
        Metric::P99Latency,
        Metric::MaxLatency,
        Metric::MaxThreadLatencySum,
    ];

    /// Column header and persisted metric name
    pub const fn name(self) -> &'static str {
        match self {
            Metric::AvgLatency => "AVG",
            Metric::MidAvgLatency => "MID_AVG",
            Metric::MinLatency => "MIN",
            Metric::P10Latency => "P10",
            Metric::P25Latency => "P25",
            Metric::MedianLatency => "MEDIAN",
            Metric::P75Latency => "P75",
            Metric::P90Latency => "P90",
            Metric::P95Latency => "P95",
            Metric::P99Latency => "P99",
            Metric::MaxLatency => "MAX",
            Metric::MaxThreadLatencySum => "SLOWEST_THREAD",
        }
    }

    /// Percentile rank for percentile metrics
    pub const fn percentile(self) -> Option<usize> {
        match self {
            Metric::P10Latency => Some(10),
            Metric::P25Latency => Some(25),
            Metric::MedianLatency => Some(50),
            Metric::P75Latency => Some(75),
            Metric::P90Latency => Some(90),
            Metric::P95Latency => Some(95),
            Metric::P99Latency => Some(99),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Statistics of a single operation with at least one latency sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatistics {
    values: [f64; Metric::COUNT],
    pub total_samples: usize,
    /// The mid-range slice was empty and `MidAvgLatency` was reported as zero
    pub mid_range_insufficient: bool,
}

impl OperationStatistics {
    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    /// `(metric, value)` pairs in report column order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Statistic table for a whole run
///
/// Operations without latency samples have no entry at all; callers must
/// read "absent" as "no data", never as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    per_operation: OperationMap<Option<OperationStatistics>>,
}

impl Statistics {
    /// Derive statistics from a fully merged measurement.
    ///
    /// Latency sequences are sorted in place, so deriving again from the same
    /// measurement is cheap and yields the same table.
    pub fn derive(measurement: &mut Measurement) -> Self {
        measurement.sort_latencies();

        let per_operation = OperationMap::from_fn(|op| {
            derive_operation(
                op,
                measurement.latencies(op),
                measurement.thread_latency_sums(op),
            )
        });

        Self { per_operation }
    }

    /// Value of `metric` for `op`, or `None` if `op` recorded no latency
    pub fn get(&self, metric: Metric, op: Operation) -> Option<f64> {
        self.per_operation[op].as_ref().map(|s| s.get(metric))
    }

    pub fn operation(&self, op: Operation) -> Option<&OperationStatistics> {
        self.per_operation[op].as_ref()
    }

    /// Operations whose mid-range average could not be computed
    pub fn insufficient_mid_range(&self) -> Vec<Operation> {
        self.per_operation
            .iter()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.mid_range_insufficient))
            .map(|(op, _)| op)
            .collect()
    }
}

/// Derive statistics from a fully merged measurement.
///
/// Must only run after every worker's measurement has been merged.
pub fn derive_statistics(measurement: &mut Measurement) -> Statistics {
    Statistics::derive(measurement)
}

/// Nearest-rank index with truncation: `floor(n * percent / 100)`
pub fn percentile_index(n: usize, percent: usize) -> usize {
    n * percent / 100
}

/// Successful points per second.
///
/// An elapsed time that is zero, negative or not a number has no meaningful
/// rate; the result is then `f64::INFINITY`, never NaN, so callers can
/// detect it with `is_finite()`.
pub fn throughput(ok_points: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 && elapsed_secs.is_finite() {
        ok_points as f64 / elapsed_secs
    } else {
        f64::INFINITY
    }
}

fn derive_operation(
    op: Operation,
    sorted: &[f64],
    thread_sums: &[f64],
) -> Option<OperationStatistics> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }

    let mut values = [0.0; Metric::COUNT];
    values[Metric::MinLatency.index()] = sorted[0];
    values[Metric::MaxLatency.index()] = sorted[n - 1];
    values[Metric::AvgLatency.index()] = sorted.iter().sum::<f64>() / n as f64;

    for metric in Metric::ALL {
        if let Some(p) = metric.percentile() {
            values[metric.index()] = sorted[percentile_index(n, p)];
        }
    }

    let lo = percentile_index(n, MID_AVG_RANGE.0);
    let hi = percentile_index(n, MID_AVG_RANGE.1);
    let mid = &sorted[lo..hi];
    let mid_range_insufficient = mid.is_empty();
    if mid_range_insufficient {
        warn!(
            "Cannot calculate mid-average latency for {}: {} samples leave the mid range empty",
            op, n
        );
    } else {
        values[Metric::MidAvgLatency.index()] = mid.iter().sum::<f64>() / mid.len() as f64;
    }

    values[Metric::MaxThreadLatencySum.index()] = thread_sums.iter().copied().fold(0.0, f64::max);

    debug!("Derived statistics for {} from {} samples", op, n);

    Some(OperationStatistics {
        values,
        total_samples: n,
        mid_range_insufficient,
    })
}
