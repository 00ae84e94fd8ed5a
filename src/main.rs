//! file-pipeline - Concurrent Directory-Processing Pipeline
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use file_pipeline::config::{CliArgs, PipelineConfig};
use file_pipeline::pipeline::Pipeline;
use file_pipeline::progress::{print_header, print_summary};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status when `--fail-on-error` is set and some files failed
const EXIT_PARTIAL_FAILURE: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = PipelineConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(&config);
    }

    let pipeline = Pipeline::new(config.clone());

    // Setup signal handler for graceful shutdown
    let shutdown_flag = pipeline.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing current chunks...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let result = pipeline.run().context("Pipeline failed")?;

    print_summary(&result.report, &config.output_dir);

    if !result.completed {
        info!("Pipeline was interrupted before completion");
    }

    if result.worker_errors > 0 {
        info!(errors = result.worker_errors, "Some workers did not exit cleanly");
    }

    if result.report.failures > 0 {
        info!(failures = result.report.failures, "Pipeline completed with failed files");
        if config.fail_on_error {
            return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("file_pipeline=debug,warn")
    } else {
        EnvFilter::new("file_pipeline=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")?;

    Ok(())
}
