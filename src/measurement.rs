//! # Measurement Accumulator
//!
//! A [`Measurement`] is the per-worker bookkeeping structure filled in while a
//! workload runs, and also the shape of the merged, run-wide result.
//!
//! ## Ownership
//!
//! Each worker thread owns exactly one `Measurement` for the whole run phase.
//! Nothing is shared and nothing locks: every recording method is a plain
//! mutation of `self` that cannot block or fail. After the driver joins the
//! workers, the coordinator folds their measurements into a fresh one with
//! [`Measurement::merge`] and then derives statistics from it once.
//!
//! ## Per-thread latency sums
//!
//! Merging keeps, per operation, the list of each contributing worker's own
//! latency total. Only the maximum of that list feeds a statistic, but the
//! full list is retained for diagnostics. Merging an already-merged
//! measurement carries its list over instead of collapsing it into one sum,
//! so grouping workers before the final merge does not change the result.

use crate::operation::{Operation, OperationMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Latency samples and success/failure counters for every operation kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    latencies: OperationMap<Vec<f64>>,
    ok_operations: OperationMap<u64>,
    fail_operations: OperationMap<u64>,
    ok_points: OperationMap<u64>,
    fail_points: OperationMap<u64>,
    thread_latency_sums: OperationMap<Vec<f64>>,
    merged_workers: usize,
    create_schema_time: f64,
    elapsed_time: f64,
}

impl Measurement {
    /// Create an empty measurement with a slot for every operation kind
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one latency sample (milliseconds) for `op`
    pub fn record_latency(&mut self, op: Operation, latency: f64) {
        self.latencies[op].push(latency);
    }

    /// Count one successful operation
    pub fn record_success(&mut self, op: Operation) {
        self.ok_operations[op] += 1;
    }

    /// Count one failed operation, independent of how many points it carried
    pub fn record_failure(&mut self, op: Operation) {
        self.fail_operations[op] += 1;
    }

    pub fn record_ok_points(&mut self, op: Operation, points: u64) {
        self.ok_points[op] += points;
    }

    pub fn record_fail_points(&mut self, op: Operation, points: u64) {
        self.fail_points[op] += points;
    }

    /// Seconds spent creating the schema before the run
    pub fn set_create_schema_time(&mut self, seconds: f64) {
        self.create_schema_time = seconds;
    }

    /// Wall-clock seconds of the run phase, schema creation excluded
    pub fn set_elapsed_time(&mut self, seconds: f64) {
        self.elapsed_time = seconds;
    }

    pub fn create_schema_time(&self) -> f64 {
        self.create_schema_time
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn latencies(&self, op: Operation) -> &[f64] {
        &self.latencies[op]
    }

    pub fn ok_operations(&self, op: Operation) -> u64 {
        self.ok_operations[op]
    }

    pub fn fail_operations(&self, op: Operation) -> u64 {
        self.fail_operations[op]
    }

    pub fn ok_points(&self, op: Operation) -> u64 {
        self.ok_points[op]
    }

    pub fn fail_points(&self, op: Operation) -> u64 {
        self.fail_points[op]
    }

    /// Per-worker latency totals for `op`, one entry per merged worker
    pub fn thread_latency_sums(&self, op: Operation) -> &[f64] {
        &self.thread_latency_sums[op]
    }

    /// Number of worker measurements folded into this one
    pub fn merged_workers(&self) -> usize {
        self.merged_workers
    }

    /// Sum of all recorded latencies for `op`
    pub fn latency_sum(&self, op: Operation) -> f64 {
        self.latencies[op].iter().sum()
    }

    /// Total number of latency samples across the catalog
    pub fn total_samples(&self) -> usize {
        self.latencies.iter().map(|(_, l)| l.len()).sum()
    }

    /// Fold `source` into `self`.
    ///
    /// Latencies are appended, counters added, and the worker latency totals
    /// extended. A source that is itself a merge result contributes its
    /// existing per-worker totals; a plain worker measurement contributes
    /// its own total for each operation.
    ///
    /// Timing fields are left untouched; they belong to the coordinator.
    pub fn merge(&mut self, source: &Measurement) {
        for op in Operation::iter() {
            self.latencies[op].extend_from_slice(&source.latencies[op]);
            self.ok_operations[op] += source.ok_operations[op];
            self.fail_operations[op] += source.fail_operations[op];
            self.ok_points[op] += source.ok_points[op];
            self.fail_points[op] += source.fail_points[op];

            if source.merged_workers == 0 {
                self.thread_latency_sums[op].push(source.latency_sum(op));
            } else {
                self.thread_latency_sums[op].extend_from_slice(&source.thread_latency_sums[op]);
            }
        }
        self.merged_workers += source.merged_workers.max(1);

        debug!(
            "Merged measurement with {} samples ({} workers total)",
            source.total_samples(),
            self.merged_workers
        );
    }

    /// Merge every measurement in `sources` into a new one
    pub fn merge_all<'a, I>(sources: I) -> Measurement
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        let mut merged = Measurement::new();
        for source in sources {
            merged.merge(source);
        }
        merged
    }

    /// Sort each latency sequence ascending in place
    pub(crate) fn sort_latencies(&mut self) {
        for (_, latencies) in self.latencies.iter_mut() {
            latencies.sort_by(f64::total_cmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(latencies: &[(Operation, f64)]) -> Measurement {
        let mut m = Measurement::new();
        for &(op, latency) in latencies {
            m.record_latency(op, latency);
            m.record_success(op);
            m.record_ok_points(op, 10);
        }
        m
    }

    #[test]
    fn test_new_measurement_is_empty() {
        let m = Measurement::new();
        for op in Operation::iter() {
            assert!(m.latencies(op).is_empty());
            assert_eq!(m.ok_operations(op), 0);
            assert_eq!(m.fail_operations(op), 0);
            assert_eq!(m.ok_points(op), 0);
            assert_eq!(m.fail_points(op), 0);
        }
        assert_eq!(m.merged_workers(), 0);
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut m = Measurement::new();
        m.record_latency(Operation::Ingestion, 3.0);
        m.record_latency(Operation::Ingestion, 0.0);
        m.record_latency(Operation::Ingestion, 1e9);

        assert_eq!(m.latencies(Operation::Ingestion), &[3.0, 0.0, 1e9]);
        assert!(m.latencies(Operation::RangeQuery).is_empty());
    }

    #[test]
    fn test_failure_counts_operations_not_points() {
        let mut m = Measurement::new();
        m.record_failure(Operation::Ingestion);
        assert_eq!(m.fail_operations(Operation::Ingestion), 1);
        assert_eq!(m.fail_points(Operation::Ingestion), 0);

        m.record_fail_points(Operation::Ingestion, 500);
        assert_eq!(m.fail_operations(Operation::Ingestion), 1);
        assert_eq!(m.fail_points(Operation::Ingestion), 500);
    }

    #[test]
    fn test_timing_fields() {
        let mut m = Measurement::new();
        m.set_create_schema_time(1.5);
        m.set_elapsed_time(12.25);
        assert_eq!(m.create_schema_time(), 1.5);
        assert_eq!(m.elapsed_time(), 12.25);
    }

    #[test]
    fn test_merge_adds_counters_and_latencies() {
        let a = worker(&[(Operation::Ingestion, 1.0), (Operation::Ingestion, 2.0)]);
        let mut b = worker(&[(Operation::Ingestion, 5.0), (Operation::RangeQuery, 7.0)]);
        b.record_failure(Operation::RangeQuery);
        b.record_fail_points(Operation::RangeQuery, 4);

        let merged = Measurement::merge_all([&a, &b]);

        assert_eq!(merged.latencies(Operation::Ingestion).len(), 3);
        assert_eq!(merged.ok_operations(Operation::Ingestion), 3);
        assert_eq!(merged.ok_points(Operation::Ingestion), 30);
        assert_eq!(merged.fail_operations(Operation::RangeQuery), 1);
        assert_eq!(merged.fail_points(Operation::RangeQuery), 4);
        assert_eq!(merged.merged_workers(), 2);
    }

    #[test]
    fn test_merge_records_per_worker_sums() {
        let a = worker(&[(Operation::Ingestion, 1.0), (Operation::Ingestion, 2.0)]);
        let b = worker(&[(Operation::Ingestion, 5.0)]);

        let merged = Measurement::merge_all([&a, &b]);

        assert_eq!(merged.thread_latency_sums(Operation::Ingestion), &[3.0, 5.0]);
        assert_eq!(merged.thread_latency_sums(Operation::RangeQuery), &[0.0, 0.0]);
    }

    #[test]
    fn test_merge_of_merged_keeps_worker_sums() {
        let a = worker(&[(Operation::Ingestion, 1.0)]);
        let b = worker(&[(Operation::Ingestion, 4.0)]);
        let c = worker(&[(Operation::Ingestion, 2.0)]);

        let left = Measurement::merge_all([&a, &b]);
        let grouped = Measurement::merge_all([&left, &c]);

        assert_eq!(grouped.thread_latency_sums(Operation::Ingestion), &[1.0, 4.0, 2.0]);
        assert_eq!(grouped.merged_workers(), 3);
    }

    #[test]
    fn test_merge_leaves_timing_untouched() {
        let mut a = worker(&[(Operation::Ingestion, 1.0)]);
        a.set_elapsed_time(99.0);

        let mut target = Measurement::new();
        target.set_elapsed_time(3.0);
        target.merge(&a);

        assert_eq!(target.elapsed_time(), 3.0);
    }

    #[test]
    fn test_sort_latencies() {
        let mut m = worker(&[
            (Operation::Ingestion, 3.0),
            (Operation::Ingestion, 1.0),
            (Operation::Ingestion, 2.0),
        ]);
        m.sort_latencies();
        assert_eq!(m.latencies(Operation::Ingestion), &[1.0, 2.0, 3.0]);
    }
}
