//! dupsweep - content-based duplicate sweeper
//!
//! Lists the regular files directly inside one directory, hashes their
//! contents, and moves every file whose digest occurs more than once into a
//! quarantine folder inside that directory, then opens the folder.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod reveal;
pub mod scanner;
pub mod signal;

use std::io;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::TransferConfig;
use crate::cli::{prompt_for_directory, Cli};
use crate::config::Config;
use crate::duplicates::{FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::output::{write_report, OutputFormat};
use crate::pipeline::{AbortReason, Pipeline, PipelineConfig, RunOutcome};
use crate::progress::{Progress, ProgressCallback};
use crate::reveal::SystemRevealer;
use crate::scanner::{Hasher, ScanConfig};

/// Run the application for parsed command-line arguments.
///
/// Fatal aborts surface as `Err` in text mode; in JSON mode they are part of
/// the printed document and only the exit code reflects them.
///
/// # Errors
///
/// Returns an error if no directory can be obtained, the signal handler
/// cannot be installed, output cannot be written, or the run aborts.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let config = apply_cli_overrides(load_config(&cli), &cli);
    log::debug!("Effective configuration: {:?}", config);

    let dir = match cli.path.clone() {
        Some(path) => path,
        None => prompt_for_directory(io::stdin().lock(), &mut io::stdout())
            .context("A directory is required")?,
    };

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let hide_progress = cli.quiet || cli.output == OutputFormat::Json;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(hide_progress));

    let pipeline_config = build_pipeline_config(&config, cli.dry_run)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let mut pipeline = Pipeline::new(pipeline_config);
    if config.reveal {
        pipeline = pipeline.with_revealer(Arc::new(SystemRevealer));
    }

    let report = pipeline.run(&dir);
    let exit_code = report.exit_code();

    if cli.output == OutputFormat::Text {
        if let RunOutcome::Aborted(reason) = report.outcome {
            return Err(anyhow::Error::new(reason))
                .with_context(|| format!("Sweep of {} aborted", dir.display()));
        }
        if cli.quiet {
            return Ok(exit_code);
        }
    }

    write_report(&report, cli.output, &mut io::stdout().lock())
        .context("Failed to write report")?;

    Ok(exit_code)
}

/// Map a fatal error from [`run_app`] to an exit code.
#[must_use]
pub fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    let interrupted = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<AbortReason>(),
            Some(AbortReason::Scan(FinderError::Interrupted))
        ) || matches!(
            cause.downcast_ref::<FinderError>(),
            Some(FinderError::Interrupted)
        )
    });
    if interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => {
            if !path.exists() {
                log::warn!("Config file {} not found, using defaults", path.display());
            }
            Config::load_from_path(path)
        }
        None => Config::load(),
    }
}

/// Apply command-line flags on top of the loaded configuration.
#[must_use]
pub fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if cli.include_hidden {
        config.exclude_hidden = false;
    }
    config.exclude_extensions.extend(cli.exclude_ext.iter().cloned());
    if let Some(threads) = cli.io_threads {
        config.io_threads = Some(usize::from(threads));
    }
    if let Some(ref destination) = cli.destination {
        config.destination.clone_from(destination);
    }
    if let Some(algorithm) = cli.hash_algorithm {
        config.hash_algorithm = algorithm;
    }
    if let Some(policy) = cli.on_hash_error {
        config.on_hash_error = policy;
    }
    if let Some(size) = cli.buffer_size {
        config.buffer_size = usize::try_from(size).unwrap_or(usize::MAX);
    }
    if cli.no_reveal {
        config.reveal = false;
    }
    config
}

/// Translate the effective configuration into pipeline settings.
#[must_use]
pub fn build_pipeline_config(config: &Config, dry_run: bool) -> PipelineConfig {
    let scan = ScanConfig::new(
        config.exclude_hidden,
        config.exclude_extensions.clone(),
        config.on_hash_error,
    );
    let hasher = Hasher::new()
        .with_algorithm(config.hash_algorithm)
        .with_buffer_size(config.buffer_size);

    let mut finder = FinderConfig::default()
        .with_scan_config(scan)
        .with_hasher(hasher);
    let mut transfer = TransferConfig::default();
    if let Some(threads) = config.io_threads {
        finder = finder.with_io_threads(threads);
        transfer = transfer.with_io_threads(threads);
    }

    PipelineConfig {
        finder,
        transfer,
        destination: config.destination.clone(),
        dry_run,
    }
}
