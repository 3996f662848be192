//! # Simulated Workload Driver
//!
//! Drives a synthetic database workload so the measurement pipeline can be
//! exercised without a database. Each client runs on its own named thread
//! (`client-<n>`) and owns one [`Measurement`] for its whole lifetime; the
//! driver joins every client before merging, so the merged result is only
//! built once all recording has stopped.
//!
//! Latencies are drawn uniformly from `[0, max_latency_ms)` and operations
//! fail with probability `failure_ratio`. Successful operations record their
//! latency and points; failed operations record only the failure and the
//! points they meant to touch.

use crate::{cli::BenchConfig, measurement::Measurement, operation::Operation, utils::duration_secs};
use anyhow::{anyhow, Context, Result};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Merged result of one driver run
#[derive(Debug)]
pub struct RunOutcome {
    /// All client measurements merged, with timing set
    pub measurement: Measurement,
    pub clients: usize,
}

/// Spawns client threads, joins them and merges their measurements
pub struct WorkloadDriver {
    config: BenchConfig,
    weights: WeightedIndex<f64>,
}

impl WorkloadDriver {
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let weights = WeightedIndex::new(config.operation_weights()?)
            .context("Invalid operation proportion")?;
        Ok(Self { config, weights })
    }

    /// Run every client to completion and return the merged measurement
    pub fn run(&self) -> Result<RunOutcome> {
        let clients = self.config.client_number;
        info!(
            "Starting {} clients with {} operations each",
            clients, self.config.loop_count
        );

        let start = Instant::now();
        let handles = (0..clients)
            .map(|client_id| {
                let config = self.config.clone();
                let weights = self.weights.clone();
                thread::Builder::new()
                    .name(format!("client-{}", client_id))
                    .spawn(move || run_client(client_id, &config, &weights))
                    .with_context(|| format!("Failed to spawn client-{}", client_id))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut worker_measurements = Vec::with_capacity(clients);
        for (client_id, handle) in handles.into_iter().enumerate() {
            let measurement = handle
                .join()
                .map_err(|_| anyhow!("client-{} panicked", client_id))?;
            worker_measurements.push(measurement);
        }
        let elapsed = duration_secs(start.elapsed());

        let mut measurement = Measurement::merge_all(&worker_measurements);
        measurement.set_create_schema_time(self.config.create_schema_time);
        measurement.set_elapsed_time(elapsed);

        info!(
            "All clients finished in {:.2}s, {} latency samples merged",
            elapsed,
            measurement.total_samples()
        );

        Ok(RunOutcome {
            measurement,
            clients,
        })
    }
}

fn run_client(client_id: usize, config: &BenchConfig, weights: &WeightedIndex<f64>) -> Measurement {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(client_id as u64)),
        None => StdRng::from_entropy(),
    };
    let latency = Uniform::new(0.0, config.max_latency_ms);
    let mut measurement = Measurement::new();

    for _ in 0..config.loop_count {
        let op = Operation::ALL[weights.sample(&mut rng)];
        let points = points_for(op, config);

        if rng.gen_bool(config.failure_ratio) {
            measurement.record_failure(op);
            measurement.record_fail_points(op, points);
        } else {
            measurement.record_latency(op, latency.sample(&mut rng));
            measurement.record_success(op);
            measurement.record_ok_points(op, points);
        }
    }

    debug!(
        "client-{} finished with {} latency samples",
        client_id,
        measurement.total_samples()
    );
    measurement
}

/// Points an operation touches under the configured data shape
fn points_for(op: Operation, config: &BenchConfig) -> u64 {
    let sensors = config.sensor_number as u64;
    match op {
        Operation::Ingestion => config.batch_size as u64 * sensors,
        Operation::PreciseQuery | Operation::LatestPointQuery => sensors,
        _ => (config.query_interval / config.point_step.max(1)).max(1) * sensors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(clients: usize, loops: usize) -> BenchConfig {
        BenchConfig {
            client_number: clients,
            loop_count: loops,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_points_for() {
        let config = BenchConfig {
            batch_size: 10,
            sensor_number: 5,
            query_interval: 1000,
            point_step: 100,
            ..Default::default()
        };
        assert_eq!(points_for(Operation::Ingestion, &config), 50);
        assert_eq!(points_for(Operation::PreciseQuery, &config), 5);
        assert_eq!(points_for(Operation::RangeQuery, &config), 50);
    }

    #[test]
    fn test_driver_counts_every_operation() {
        let driver = WorkloadDriver::new(config(3, 50)).unwrap();
        let outcome = driver.run().unwrap();
        let m = &outcome.measurement;

        let total: u64 = Operation::iter()
            .map(|op| m.ok_operations(op) + m.fail_operations(op))
            .sum();
        assert_eq!(total, 150);
        assert_eq!(m.merged_workers(), 3);
        assert_eq!(outcome.clients, 3);
        assert!(m.elapsed_time() >= 0.0);
    }

    #[test]
    fn test_failures_record_no_latency() {
        let config = BenchConfig {
            failure_ratio: 1.0,
            ..config(2, 20)
        };
        let outcome = WorkloadDriver::new(config).unwrap().run().unwrap();

        assert_eq!(outcome.measurement.total_samples(), 0);
        let failed: u64 = Operation::iter()
            .map(|op| outcome.measurement.fail_operations(op))
            .sum();
        assert_eq!(failed, 40);
    }

    #[test]
    fn test_operation_mix_follows_weights() {
        let config = BenchConfig {
            operation_proportion: "1:0:0:0:0:0:0:0:0".to_string(),
            failure_ratio: 0.0,
            ..config(2, 10)
        };
        let outcome = WorkloadDriver::new(config).unwrap().run().unwrap();

        assert_eq!(outcome.measurement.ok_operations(Operation::Ingestion), 20);
        assert_eq!(outcome.measurement.latencies(Operation::Ingestion).len(), 20);
        assert_eq!(outcome.measurement.ok_operations(Operation::RangeQuery), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(WorkloadDriver::new(config(0, 10)).is_err());

        let unbounded_latency = BenchConfig {
            max_latency_ms: f64::INFINITY,
            ..config(1, 10)
        };
        assert!(WorkloadDriver::new(unbounded_latency).is_err());
    }
}
