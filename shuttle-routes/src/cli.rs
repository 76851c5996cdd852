///
/// This module implements the CLI interface for shuttle-routes: command parsing, argument
/// validation and the async entrypoint used by `main` and by integration tests.
///
/// All extraction, validation and publishing logic lives in the [`shuttle-routes-core`] crate.
/// This module is strictly CLI glue and stage orchestration wiring.
///
/// ## How To Use
/// - For command-line users: run the `shuttle-routes` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`shuttle-routes-core`]: ../../shuttle-routes-core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
use crate::capability::check_ocr;
use crate::load_config::load_config;
use crate::stages::{Mode, Pipeline, RunOptions, Stage};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI for shuttle-routes: build the Seoul free shuttle-bus route catalog.
#[derive(Parser)]
#[clap(
    name = "shuttle-routes",
    version,
    about = "Extract, geocode, validate and publish Seoul shuttle-bus routes from crawled and OCR'd notices"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run pipeline stages over the artifacts under the configured data directory
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,

        #[clap(long, value_enum, default_value_t = Mode::Quick)]
        mode: Mode,

        /// Run only these stages (overrides --mode)
        #[clap(long, value_enum, num_args = 1..)]
        stages: Vec<Stage>,

        /// Leave out these stages
        #[clap(long, value_enum, num_args = 1..)]
        skip: Vec<Stage>,

        /// Skip the remaining stages after the first failure
        #[clap(long)]
        stop_on_error: bool,
    },
    /// Check that the external OCR tools are installed
    Doctor,
}

/// Async CLI entrypoint for integration tests and main().
///
/// Returns exit code 1 when a stage failed or a capability is missing.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run {
            config,
            mode,
            stages,
            skip,
            stop_on_error,
        } => {
            let config = load_config(config)?;
            let options = RunOptions {
                mode,
                stages,
                skip,
                stop_on_error,
            };
            tracing::info!(command = "run", ?mode, "Starting pipeline run");
            let report = Pipeline::new(config).run(&options).await?;

            println!(
                "Pipeline {}: {} completed, {} failed, {} skipped",
                report.pipeline_status,
                report.stages_completed,
                report.stages_failed,
                report.stages_skipped
            );
            for e in &report.errors {
                println!("  [{}] {}", e.stage.id(), e.error);
            }
            Ok(if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Doctor => {
            tracing::info!(command = "doctor", "Checking external capabilities");
            let ocr = tokio::task::spawn_blocking(check_ocr).await?;
            println!("OCR: {ocr}");
            Ok(if ocr.is_ready() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
