//! # Benchmark Measurement Library
//!
//! Aggregation and statistics engine for database benchmark workloads. Worker
//! threads record per-operation latencies and success/failure counters into
//! their own [`Measurement`]; once every worker has finished, the coordinator
//! merges them and derives one statistic table for reporting.
//!
//! ## Architecture Overview
//!
//! - `operation`: the closed catalog of workload operation kinds
//! - `measurement`: per-worker accumulator and the merge of many accumulators
//! - `metrics`: percentile, average and throughput derivation
//! - `persistence`: sinks receiving `(category, metric, value)` results
//! - `results`: console report rendering and JSON summaries
//! - `cli`: command-line arguments and the run configuration
//! - `workload`: simulated multi-threaded workload driver
//!
//! ## Usage Example
//!
//! ```rust
//! use bench_measurement::{Measurement, Metric, Operation, Statistics};
//!
//! let mut worker_a = Measurement::new();
//! let mut worker_b = Measurement::new();
//! for latency in [10.0, 20.0, 30.0, 40.0, 50.0] {
//!     worker_a.record_latency(Operation::Ingestion, latency);
//!     worker_a.record_success(Operation::Ingestion);
//! }
//! for latency in [60.0, 70.0, 80.0, 90.0, 100.0] {
//!     worker_b.record_latency(Operation::Ingestion, latency);
//!     worker_b.record_success(Operation::Ingestion);
//! }
//!
//! let mut merged = Measurement::merge_all([&worker_a, &worker_b]);
//! let stats = Statistics::derive(&mut merged);
//!
//! assert_eq!(stats.get(Metric::MedianLatency, Operation::Ingestion), Some(60.0));
//! assert_eq!(stats.get(Metric::MaxThreadLatencySum, Operation::Ingestion), Some(400.0));
//! assert_eq!(stats.get(Metric::MedianLatency, Operation::RangeQuery), None);
//! ```
//!
//! ## Concurrency Model
//!
//! Recording never locks: a `Measurement` is owned by exactly one thread
//! while it is being filled. Merging and derivation happen afterwards on a
//! single coordinator thread.

/// Command-line interface and run configuration
pub mod cli;

/// Tracing output formatting for the binary
pub mod logging;

/// Per-worker accumulator and merge
pub mod measurement;

/// Statistic derivation over merged measurements
///
/// Provides:
/// - Truncating nearest-rank percentiles (P10 through P99)
/// - Average, mid-range average, minimum and maximum latency
/// - Slowest-worker latency total
/// - Throughput in points per second
pub mod metrics;

/// Operation catalog and dense per-operation maps
pub mod operation;

/// Result persistence sinks
pub mod persistence;

/// Report rendering and summaries
pub mod results;

pub mod utils;

/// Simulated workload driver
pub mod workload;

pub use cli::{Args, BenchConfig};
pub use measurement::Measurement;
pub use metrics::{derive_statistics, throughput, Metric, Statistics};
pub use operation::{Operation, OperationMap};
pub use persistence::{PersistenceFactory, PersistenceKind, ResultPersistence};
pub use results::{MeasurementSummary, Reporter};

/// The current version of the crate, recorded in persisted results
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Database label shown in the configuration block
    pub const DB_SWITCH: &str = "IoTDB";

    /// Equal weight for every operation kind
    pub const OPERATION_PROPORTION: &str = "1:1:1:1:1:1:1:1:1";

    pub const GROUP_NUMBER: usize = 10;

    pub const DEVICE_NUMBER: usize = 50;

    pub const SENSOR_NUMBER: usize = 10;

    pub const BATCH_SIZE: usize = 100;

    /// Operations per client
    pub const LOOP: usize = 1000;

    /// Milliseconds between consecutive points
    pub const POINT_STEP: u64 = 1000;

    /// Query window in milliseconds
    pub const QUERY_INTERVAL: u64 = 250_000;

    pub const OVERFLOW_RATIO: f64 = 0.5;

    /// Share of simulated operations that fail
    pub const FAILURE_RATIO: f64 = 0.01;

    /// Upper bound of simulated latency in milliseconds
    pub const MAX_LATENCY_MS: f64 = 50.0;

    /// File stem for csv/json persistence when no output file is given
    pub const RESULT_FILE_STEM: &str = "benchmark_results";
}
