//! `polysurf` command line tool.
//!
//! ```text
//! polysurf scan.xyz --shdetection ransac --lod less
//! polysurf building.ply --given planes --method poisson --outformat ply -o building.out.ply
//! polysurf a.xyz b.xyz --shdetection region_growing --search-radius 0.5 --min-region-size 50
//! polysurf scan.xyz --config run.json -v
//! ```
//!
//! Exits non-zero if options are rejected or any input fails. Failures are
//! reported on stderr as `error[<kind>]: <message chain>`.

#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod args;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use polysurf::{Pipeline, PipelineError};
use polysurf_engine::{ScanEngine, ScanEngineParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether every job succeeded.
fn run(cli: &Cli) -> Result<bool> {
    let options = cli.options()?;
    let jobs = cli.jobs(options.output_format)?;

    let mut params = ScanEngineParams::default();
    if let Some(seed) = cli.seed {
        params = params.with_seed(seed);
    }

    let pipeline = match Pipeline::new(ScanEngine::with_params(params), &options) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            report_failure(err);
            return Ok(false);
        }
    };

    let results = if jobs.len() == 1 {
        jobs.iter().map(|job| pipeline.run_job(job)).collect()
    } else {
        pipeline.run_batch(&jobs)
    };

    let mut succeeded = 0usize;
    let total = results.len();
    for result in results {
        match result {
            Ok(report) => {
                println!("{report}");
                succeeded += 1;
            }
            Err(err) => report_failure(err),
        }
    }

    if total > 1 {
        info!(succeeded, failed = total - succeeded, "All jobs finished");
    }
    Ok(succeeded == total)
}

fn report_failure(err: PipelineError) {
    let kind = err.kind();
    let stage = err.last_completed_stage();
    let err = anyhow::Error::new(err);
    eprintln!("error[{kind}]: {err:#} (after stage: {stage})");
}
