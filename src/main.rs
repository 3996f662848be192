//! # Benchmark Measurement - Main Entry Point
//!
//! Runs the simulated workload and reports its measurements:
//! 1. **Initialize logging**: thread-tagged tracing output
//! 2. **Parse arguments**: build the run configuration
//! 3. **Run clients**: one thread and one measurement per client
//! 4. **Merge and derive**: fold all measurements, derive statistics once
//! 5. **Report**: print the matrices and persist every result

use anyhow::Result;
use bench_measurement::{
    cli::{Args, BenchConfig},
    logging,
    metrics::Statistics,
    persistence::PersistenceFactory,
    results::{MeasurementSummary, Reporter},
    utils::generate_run_id,
    workload::WorkloadDriver,
};
use clap::Parser;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    info!("Starting benchmark measurement");
    let config = BenchConfig::from(&args);
    let reporter = Reporter::new(config.clone());
    let mut stdout = std::io::stdout().lock();
    reporter.show_configs(&mut stdout)?;

    let driver = WorkloadDriver::new(config.clone())?;
    let outcome = match driver.run() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Workload failed: {:#}", e);
            return Err(e);
        }
    };

    let mut measurement = outcome.measurement;
    let statistics = Statistics::derive(&mut measurement);

    let run_id = generate_run_id();
    let sink = PersistenceFactory::create(args.persistence, args.output_file.as_deref(), &run_id)?;
    info!("Persisting results to {} (run {})", args.persistence, run_id);
    reporter.report(&measurement, &statistics, sink, &mut stdout)?;

    if let Some(ref summary_file) = args.summary_file {
        MeasurementSummary::new(&config, &measurement, &statistics).write_json(summary_file)?;
    }

    info!("Benchmark measurement completed for {} clients", outcome.clients);
    Ok(())
}
