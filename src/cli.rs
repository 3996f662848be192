use crate::operation::Operation;
use crate::persistence::PersistenceKind;
use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Database benchmark measurement harness
#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Target database label, shown in the configuration block only
    #[clap(long, default_value = crate::defaults::DB_SWITCH, help_heading = "Workload Options")]
    pub db_switch: String,

    /// Operation mix weights, colon-separated, one per operation kind
    #[clap(long, default_value = crate::defaults::OPERATION_PROPORTION)]
    pub operation_proportion: String,

    /// Bind each client to a fixed group of devices
    #[clap(long, default_value_t = false)]
    pub is_client_bind: bool,

    /// Number of concurrent client threads (defaults to the number of CPUs)
    #[clap(short = 'c', long)]
    pub client_number: Option<usize>,

    /// Number of storage groups
    #[clap(long, default_value_t = crate::defaults::GROUP_NUMBER)]
    pub group_number: usize,

    /// Number of devices
    #[clap(long, default_value_t = crate::defaults::DEVICE_NUMBER)]
    pub device_number: usize,

    /// Number of sensors per device
    #[clap(long, default_value_t = crate::defaults::SENSOR_NUMBER)]
    pub sensor_number: usize,

    /// Points written per sensor in one ingestion batch
    #[clap(short = 'b', long, default_value_t = crate::defaults::BATCH_SIZE)]
    pub batch_size: usize,

    /// Operations executed by each client
    #[clap(short = 'l', long = "loop", default_value_t = crate::defaults::LOOP)]
    pub loop_count: usize,

    /// Timestamp step between consecutive points (ms)
    #[clap(long, default_value_t = crate::defaults::POINT_STEP)]
    pub point_step: u64,

    /// Query window length (ms)
    #[clap(long, default_value_t = crate::defaults::QUERY_INTERVAL)]
    pub query_interval: u64,

    /// Write out-of-order data
    #[clap(long, default_value_t = false)]
    pub is_overflow: bool,

    /// Out-of-order generation mode
    #[clap(long, value_enum, default_value_t = OverflowMode::Poisson)]
    pub overflow_mode: OverflowMode,

    /// Share of out-of-order points
    #[clap(long, default_value_t = crate::defaults::OVERFLOW_RATIO)]
    pub overflow_ratio: f64,

    /// Share of simulated operations that fail
    #[clap(long, default_value_t = crate::defaults::FAILURE_RATIO, help_heading = "Simulation Options")]
    pub failure_ratio: f64,

    /// Upper bound of simulated operation latency (ms)
    #[clap(long, default_value_t = crate::defaults::MAX_LATENCY_MS)]
    pub max_latency_ms: f64,

    /// Seconds reported as schema creation time
    #[clap(long, default_value_t = 0.0)]
    pub create_schema_time: f64,

    /// Seed for the simulated workload; random when omitted
    #[clap(long)]
    pub seed: Option<u64>,

    /// Where computed results are persisted
    #[clap(short = 'p', long, value_enum, default_value_t = PersistenceKind::None, help_heading = "Output Options")]
    pub persistence: PersistenceKind,

    /// Output file for csv/json persistence
    #[clap(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Also write a JSON summary of counters and statistics
    #[clap(long)]
    pub summary_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Out-of-order data generation modes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OverflowMode {
    #[default]
    #[clap(name = "poisson")]
    Poisson,

    #[clap(name = "batch")]
    Batch,
}

impl std::fmt::Display for OverflowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowMode::Poisson => write!(f, "0"),
            OverflowMode::Batch => write!(f, "1"),
        }
    }
}

/// Run configuration handed to the driver and the reporter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub db_switch: String,
    pub operation_proportion: String,
    pub is_client_bind: bool,
    pub client_number: usize,
    pub group_number: usize,
    pub device_number: usize,
    pub sensor_number: usize,
    pub batch_size: usize,
    pub loop_count: usize,
    pub point_step: u64,
    pub query_interval: u64,
    pub is_overflow: bool,
    pub overflow_mode: OverflowMode,
    pub overflow_ratio: f64,
    pub failure_ratio: f64,
    pub max_latency_ms: f64,
    pub create_schema_time: f64,
    pub seed: Option<u64>,
}

impl From<&Args> for BenchConfig {
    fn from(args: &Args) -> Self {
        Self {
            db_switch: args.db_switch.clone(),
            operation_proportion: args.operation_proportion.clone(),
            is_client_bind: args.is_client_bind,
            client_number: args.client_number.unwrap_or_else(num_cpus::get),
            group_number: args.group_number,
            device_number: args.device_number,
            sensor_number: args.sensor_number,
            batch_size: args.batch_size,
            loop_count: args.loop_count,
            point_step: args.point_step,
            query_interval: args.query_interval,
            is_overflow: args.is_overflow,
            overflow_mode: args.overflow_mode,
            overflow_ratio: args.overflow_ratio,
            failure_ratio: args.failure_ratio,
            max_latency_ms: args.max_latency_ms,
            create_schema_time: args.create_schema_time,
            seed: args.seed,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            db_switch: crate::defaults::DB_SWITCH.to_string(),
            operation_proportion: crate::defaults::OPERATION_PROPORTION.to_string(),
            is_client_bind: false,
            client_number: 1,
            group_number: crate::defaults::GROUP_NUMBER,
            device_number: crate::defaults::DEVICE_NUMBER,
            sensor_number: crate::defaults::SENSOR_NUMBER,
            batch_size: crate::defaults::BATCH_SIZE,
            loop_count: crate::defaults::LOOP,
            point_step: crate::defaults::POINT_STEP,
            query_interval: crate::defaults::QUERY_INTERVAL,
            is_overflow: false,
            overflow_mode: OverflowMode::Poisson,
            overflow_ratio: crate::defaults::OVERFLOW_RATIO,
            failure_ratio: crate::defaults::FAILURE_RATIO,
            max_latency_ms: crate::defaults::MAX_LATENCY_MS,
            create_schema_time: 0.0,
            seed: None,
        }
    }
}

impl BenchConfig {
    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.client_number == 0 {
            return Err(anyhow!("client_number must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.failure_ratio) {
            return Err(anyhow!(
                "failure_ratio must be within [0, 1], got {}",
                self.failure_ratio
            ));
        }
        if !self.max_latency_ms.is_finite() || self.max_latency_ms <= 0.0 {
            return Err(anyhow!(
                "max_latency_ms must be a positive finite number, got {}",
                self.max_latency_ms
            ));
        }
        self.operation_weights()?;
        Ok(())
    }

    /// Parse `operation_proportion` into one weight per operation kind
    pub fn operation_weights(&self) -> Result<[f64; Operation::COUNT]> {
        let parts: Vec<&str> = self.operation_proportion.split(':').collect();
        if parts.len() != Operation::COUNT {
            return Err(anyhow!(
                "operation_proportion needs {} weights, got {}",
                Operation::COUNT,
                parts.len()
            ));
        }

        let mut weights = [0.0; Operation::COUNT];
        for (weight, part) in weights.iter_mut().zip(parts) {
            *weight = part
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow!("Invalid operation weight: {}", part))?;
            if *weight < 0.0 || !weight.is_finite() {
                return Err(anyhow!("Operation weight must be non-negative: {}", part));
            }
        }

        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(anyhow!("operation_proportion must contain a positive weight"));
        }
        Ok(weights)
    }
}

impl std::fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "----------------------Main Configurations----------------------"
        )?;
        writeln!(f, "DB_SWITCH: {}", self.db_switch)?;
        writeln!(f, "OPERATION_PROPORTION: {}", self.operation_proportion)?;
        writeln!(f, "IS_CLIENT_BIND: {}", self.is_client_bind)?;
        writeln!(f, "CLIENT_NUMBER: {}", self.client_number)?;
        writeln!(f, "GROUP_NUMBER: {}", self.group_number)?;
        writeln!(f, "DEVICE_NUMBER: {}", self.device_number)?;
        writeln!(f, "SENSOR_NUMBER: {}", self.sensor_number)?;
        writeln!(f, "BATCH_SIZE: {}", self.batch_size)?;
        writeln!(f, "LOOP: {}", self.loop_count)?;
        writeln!(f, "POINT_STEP: {}", self.point_step)?;
        writeln!(f, "QUERY_INTERVAL: {}", self.query_interval)?;
        writeln!(f, "IS_OVERFLOW: {}", self.is_overflow)?;
        writeln!(f, "OVERFLOW_MODE: {}", self.overflow_mode)?;
        writeln!(f, "OVERFLOW_RATIO: {}", self.overflow_ratio)?;
        write!(
            f,
            "---------------------------------------------------------------"
        )
    }
}
