use crate::{
    cli::BenchConfig,
    measurement::Measurement,
    metrics::{throughput, Metric, Statistics},
    operation::Operation,
    persistence::{ResultPersistence, TOTAL_CATEGORY},
    utils::{format_optional, format_value, pad},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info, warn};

const RESULT_ITEM_WIDTH: usize = 20;
const LATENCY_ITEM_WIDTH: usize = 12;

/// Whole-run result names
pub mod total_result {
    pub const CREATE_SCHEMA_TIME: &str = "createSchemaTime";
    pub const ELAPSED_TIME: &str = "elapsedTime";
}

/// Per-operation counter result names
pub mod operation_result {
    pub const OK_OPERATION_NUM: &str = "okOperationNum";
    pub const OK_POINT_NUM: &str = "okPointNum";
    pub const FAIL_OPERATION_NUM: &str = "failOperationNum";
    pub const FAIL_POINT_NUM: &str = "failPointNum";
    pub const THROUGHPUT: &str = "throughput";
}

/// Renders run results and forwards them to a persistence sink
pub struct Reporter {
    config: BenchConfig,
}

impl Reporter {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Print the configuration block
    pub fn show_configs<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.config)?;
        Ok(())
    }

    /// One reporting pass: counters, then statistics, then close the sink.
    ///
    /// The sink is closed exactly once, even when saving a result failed.
    pub fn report<W: Write>(
        &self,
        measurement: &Measurement,
        statistics: &Statistics,
        mut sink: Box<dyn ResultPersistence>,
        out: &mut W,
    ) -> Result<()> {
        let shown = self
            .show_measurements(measurement, sink.as_mut(), out)
            .and_then(|_| self.show_metrics(statistics, sink.as_mut(), out));
        let closed = sink.close().context("Failed to close result persistence");

        shown?;
        closed?;
        info!("Reporting pass completed");
        Ok(())
    }

    /// Print timing and the result matrix, saving each value to `sink`
    pub fn show_measurements<W: Write>(
        &self,
        measurement: &Measurement,
        sink: &mut dyn ResultPersistence,
        out: &mut W,
    ) -> Result<()> {
        let schema_time = measurement.create_schema_time();
        let elapsed = measurement.elapsed_time();

        writeln!(out, "Create schema cost {:.2} second", schema_time)?;
        writeln!(
            out,
            "Test elapsed time (not include schema creation): {:.2} second",
            elapsed
        )?;
        // Debug keeps the fractional part, so 10.0 persists as "10.0"
        save(sink, TOTAL_CATEGORY, total_result::CREATE_SCHEMA_TIME, &format!("{:?}", schema_time))?;
        save(sink, TOTAL_CATEGORY, total_result::ELAPSED_TIME, &format!("{:?}", elapsed))?;

        writeln!(out, "{}", banner("Result Matrix", RESULT_ITEM_WIDTH * 6 + 9))?;
        let header = [
            "Operation",
            "okOperation",
            "okPoint",
            "failOperation",
            "failPoint",
            "throughput(point/s)",
        ];
        writeln!(out, "{}", row(header.iter().copied(), RESULT_ITEM_WIDTH))?;

        if !throughput(1, elapsed).is_finite() {
            warn!(
                "Elapsed time is {}; throughput is reported as {}",
                elapsed,
                format_value(f64::INFINITY)
            );
        }

        for op in Operation::iter() {
            let category = op.as_str();
            let counters = [
                (operation_result::OK_OPERATION_NUM, measurement.ok_operations(op)),
                (operation_result::OK_POINT_NUM, measurement.ok_points(op)),
                (operation_result::FAIL_OPERATION_NUM, measurement.fail_operations(op)),
                (operation_result::FAIL_POINT_NUM, measurement.fail_points(op)),
            ];
            let rate = format_value(throughput(measurement.ok_points(op), elapsed));

            let mut cells = vec![category.to_string()];
            for (name, value) in counters {
                let value = value.to_string();
                save(sink, category, name, &value)?;
                cells.push(value);
            }
            save(sink, category, operation_result::THROUGHPUT, &rate)?;
            cells.push(rate);

            writeln!(out, "{}", row(cells.iter().map(String::as_str), RESULT_ITEM_WIDTH))?;
        }
        writeln!(out, "{}", "-".repeat(RESULT_ITEM_WIDTH * 6 + 9))?;
        Ok(())
    }

    /// Print the latency matrix, saving every present statistic to `sink`
    ///
    /// Operations without samples print `-` and save nothing.
    pub fn show_metrics<W: Write>(
        &self,
        statistics: &Statistics,
        sink: &mut dyn ResultPersistence,
        out: &mut W,
    ) -> Result<()> {
        let width = RESULT_ITEM_WIDTH + LATENCY_ITEM_WIDTH * Metric::COUNT;
        writeln!(out, "{}", banner("Latency (ms) Matrix", width))?;

        let mut header = pad("Operation", RESULT_ITEM_WIDTH);
        for metric in Metric::ALL {
            header.push_str(&pad(metric.name(), LATENCY_ITEM_WIDTH));
        }
        writeln!(out, "{}", header.trim_end())?;

        for op in Operation::iter() {
            let mut line = pad(op.as_str(), RESULT_ITEM_WIDTH);
            for metric in Metric::ALL {
                let value = statistics.get(metric, op);
                if let Some(v) = value {
                    save(sink, op.as_str(), metric.name(), &format_value(v))?;
                }
                line.push_str(&pad(&format_optional(value), LATENCY_ITEM_WIDTH));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        writeln!(out, "{}", "-".repeat(width))?;

        let insufficient = statistics.insufficient_mid_range();
        if !insufficient.is_empty() {
            debug!("Mid-range average unavailable for {:?}", insufficient);
        }
        Ok(())
    }
}

fn save(sink: &mut dyn ResultPersistence, category: &str, metric: &str, value: &str) -> Result<()> {
    sink.save_result(category, metric, value)
        .with_context(|| format!("Failed to save {}/{}", category, metric))
}

fn banner(title: &str, width: usize) -> String {
    let dashes = width.saturating_sub(title.len());
    let left = dashes / 2;
    format!("{}{}{}", "-".repeat(left), title, "-".repeat(dashes - left))
}

fn row<'a>(cells: impl Iterator<Item = &'a str>, width: usize) -> String {
    let line: String = cells.map(|c| pad(c, width)).collect();
    line.trim_end().to_string()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Counters and statistics of one operation kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub ok_operations: u64,
    pub fail_operations: u64,
    pub ok_points: u64,
    pub fail_points: u64,
    /// Points per second; `None` when the elapsed time gives no finite rate
    pub throughput: Option<f64>,
    /// Latency statistics (ms) keyed by metric name; empty without samples,
    /// `None` for a non-finite statistic
    pub latency: BTreeMap<String, Option<f64>>,
}

/// Serializable summary of a whole run.
///
/// JSON has no representation for infinity or NaN, so every non-finite
/// value is stored as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub config: BenchConfig,
    pub create_schema_time: Option<f64>,
    pub elapsed_time: Option<f64>,
    pub workers: usize,
    pub operations: BTreeMap<String, OperationSummary>,
}

impl MeasurementSummary {
    pub fn new(config: &BenchConfig, measurement: &Measurement, statistics: &Statistics) -> Self {
        let elapsed = measurement.elapsed_time();
        let operations = Operation::iter()
            .map(|op| {
                let rate = throughput(measurement.ok_points(op), elapsed);
                let latency: BTreeMap<String, Option<f64>> = statistics
                    .operation(op)
                    .map(|s| {
                        s.iter()
                            .map(|(m, v)| (m.name().to_string(), finite(v)))
                            .collect()
                    })
                    .unwrap_or_default();
                let summary = OperationSummary {
                    ok_operations: measurement.ok_operations(op),
                    fail_operations: measurement.fail_operations(op),
                    ok_points: measurement.ok_points(op),
                    fail_points: measurement.fail_points(op),
                    throughput: finite(rate),
                    latency,
                };
                (op.as_str().to_string(), summary)
            })
            .collect();

        Self {
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            config: config.clone(),
            create_schema_time: finite(measurement.create_schema_time()),
            elapsed_time: finite(elapsed),
            workers: measurement.merged_workers(),
            operations,
        }
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {:?}", path))?;
        info!("Summary written to: {:?}", path);
        Ok(())
    }
}
