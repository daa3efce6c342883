//! The full sweep: detect, quarantine, reveal.
//!
//! [`Pipeline::run`] never terminates the process and never returns `Err`.
//! Every terminal state, fatal aborts included, is a [`RunOutcome`] inside
//! the returned [`RunReport`], and the caller decides what to do with it.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::pipeline::{Pipeline, PipelineConfig, RunOutcome};
//! use dupsweep::reveal::SystemRevealer;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default())
//!     .with_revealer(Arc::new(SystemRevealer));
//! let report = pipeline.run(Path::new("/home/user/Downloads"));
//!
//! match &report.outcome {
//!     RunOutcome::NoDuplicates => println!("Nothing to do"),
//!     RunOutcome::Completed(batch) => println!("{}", batch.summary()),
//!     RunOutcome::DryRun => println!("{} would move", report.duplicates_found()),
//!     RunOutcome::Aborted(reason) => eprintln!("Aborted: {}", reason),
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::actions::{ensure_destination, move_batch, BatchTransferResult, TransferConfig};
use crate::actions::{TransferError, TransferFailure};
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::progress::ProgressCallback;
use crate::reveal::Revealer;
use crate::scanner::FileRecord;

/// Default quarantine directory name, created inside the scanned directory.
pub const DEFAULT_DESTINATION: &str = "duplicates";

/// Why a run stopped before completing.
#[derive(Debug, thiserror::Error)]
pub enum AbortReason {
    /// Listing, hashing or interruption during detection.
    #[error(transparent)]
    Scan(#[from] FinderError),

    /// The quarantine directory could not be created.
    #[error("Cannot create quarantine directory: {0}")]
    Destination(TransferError),
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// No digest occurs twice; nothing was created or moved.
    NoDuplicates,
    /// Duplicates were found and transfers attempted.
    Completed(BatchTransferResult),
    /// Duplicates were found but the run was told not to move them.
    DryRun,
    /// The run stopped early; nothing was moved.
    Aborted(AbortReason),
}

/// Wall-clock time per phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    /// Directory listing
    pub list: Duration,
    /// Content hashing
    pub hash: Duration,
    /// Duplicate grouping
    pub group: Duration,
    /// Quarantine transfers
    pub transfer: Duration,
}

/// Everything a caller needs to report on a run.
#[derive(Debug)]
pub struct RunReport {
    /// Scanned directory
    pub directory: PathBuf,
    /// Quarantine directory (created only when something is moved)
    pub destination: PathBuf,
    /// Regular files found
    pub files_listed: usize,
    /// Files excluded as hidden or by extension
    pub files_excluded: usize,
    /// Files hashed (the FileSet)
    pub files_considered: usize,
    /// Files skipped after a hash failure
    pub files_skipped: usize,
    /// Selected duplicates in listing order
    pub duplicates: Vec<FileRecord>,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Per-phase durations
    pub timings: PhaseTimings,
    /// Whether the reveal collaborator was invoked successfully
    pub revealed: bool,
}

impl RunReport {
    fn new(directory: &Path, destination: PathBuf, outcome: RunOutcome) -> Self {
        Self {
            directory: directory.to_path_buf(),
            destination,
            files_listed: 0,
            files_excluded: 0,
            files_considered: 0,
            files_skipped: 0,
            duplicates: Vec::new(),
            outcome,
            timings: PhaseTimings::default(),
            revealed: false,
        }
    }

    /// Number of files selected for quarantine.
    #[must_use]
    pub fn duplicates_found(&self) -> usize {
        self.duplicates.len()
    }

    /// Number of files actually moved.
    #[must_use]
    pub fn moved_count(&self) -> usize {
        match &self.outcome {
            RunOutcome::Completed(batch) => batch.success_count(),
            _ => 0,
        }
    }

    /// Per-file transfer failures, if any.
    #[must_use]
    pub fn failures(&self) -> &[TransferFailure] {
        match &self.outcome {
            RunOutcome::Completed(batch) => &batch.failures,
            _ => &[],
        }
    }

    /// Map the outcome to a process exit code.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match &self.outcome {
            RunOutcome::NoDuplicates => ExitCode::NoDuplicates,
            RunOutcome::DryRun => ExitCode::Success,
            RunOutcome::Aborted(AbortReason::Scan(FinderError::Interrupted)) => {
                ExitCode::Interrupted
            }
            RunOutcome::Aborted(_) => ExitCode::GeneralError,
            RunOutcome::Completed(batch) => {
                if batch
                    .failures
                    .iter()
                    .any(|f| matches!(f.error, TransferError::Interrupted(_)))
                {
                    ExitCode::Interrupted
                } else if batch.all_succeeded() {
                    ExitCode::Success
                } else {
                    ExitCode::PartialSuccess
                }
            }
        }
    }
}

/// Configuration for a whole run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Detection settings
    pub finder: FinderConfig,
    /// Transfer settings
    pub transfer: TransferConfig,
    /// Quarantine directory name, relative to the scanned directory
    pub destination: String,
    /// Detect only; create and move nothing
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            finder: FinderConfig::default(),
            transfer: TransferConfig::default(),
            destination: DEFAULT_DESTINATION.to_string(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// Share one shutdown flag between detection and transfers.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.finder = self.finder.with_shutdown_flag(Arc::clone(&flag));
        self.transfer = self.transfer.with_shutdown_flag(flag);
        self
    }

    /// Report every phase to one progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.finder = self.finder.with_progress_callback(Arc::clone(&callback));
        self.transfer = self.transfer.with_progress_callback(callback);
        self
    }
}

/// Runs one sweep over one directory.
pub struct Pipeline {
    config: PipelineConfig,
    revealer: Option<Arc<dyn Revealer>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("revealer", &self.revealer.as_ref().map(|_| "<revealer>"))
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline with no reveal collaborator.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            revealer: None,
        }
    }

    /// Reveal the quarantine directory through `revealer` after a move.
    #[must_use]
    pub fn with_revealer(mut self, revealer: Arc<dyn Revealer>) -> Self {
        self.revealer = Some(revealer);
        self
    }

    /// Sweep `dir`.
    pub fn run(&self, dir: &Path) -> RunReport {
        let destination = dir.join(&self.config.destination);
        log::info!("Sweeping {}", dir.display());

        let finder = DuplicateFinder::new(self.config.finder.clone());
        let scan = match finder.find_duplicates(dir) {
            Ok(scan) => scan,
            Err(e) => {
                log::error!("Run aborted: {}", e);
                return RunReport::new(dir, destination, RunOutcome::Aborted(e.into()));
            }
        };

        let summary = &scan.summary;
        let mut report = RunReport::new(dir, destination, RunOutcome::NoDuplicates);
        report.files_listed = summary.files_listed;
        report.files_excluded = summary.files_excluded;
        report.files_considered = summary.files_considered;
        report.files_skipped = summary.files_skipped;
        report.timings.list = summary.list_duration;
        report.timings.hash = summary.hash_duration;
        report.timings.group = summary.group_duration;

        if !scan.has_duplicates() {
            log::info!("No duplicates among {} files", report.files_considered);
            return report;
        }
        report.duplicates = scan.duplicates;

        if self.config.transfer.is_shutdown_requested() {
            log::warn!("Interrupted before moving, leaving all files in place");
            report.outcome = RunOutcome::Aborted(AbortReason::Scan(FinderError::Interrupted));
            return report;
        }

        if self.config.dry_run {
            log::info!(
                "Dry run: {} files would be moved to {}",
                report.duplicates.len(),
                report.destination.display()
            );
            report.outcome = RunOutcome::DryRun;
            return report;
        }

        if let Err(e) = ensure_destination(&report.destination) {
            log::error!("Run aborted: {}", e);
            report.outcome = RunOutcome::Aborted(AbortReason::Destination(e));
            return report;
        }

        let start = Instant::now();
        let batch = move_batch(
            &report.duplicates,
            dir,
            &report.destination,
            &self.config.transfer,
        );
        report.timings.transfer = start.elapsed();

        let moved_any = batch.success_count() > 0;
        report.outcome = RunOutcome::Completed(batch);

        if moved_any {
            if let Some(ref revealer) = self.revealer {
                report.revealed = reveal(revealer.as_ref(), &report.destination);
            }
        }

        report
    }
}

fn reveal(revealer: &dyn Revealer, destination: &Path) -> bool {
    let absolute = fs::canonicalize(destination).unwrap_or_else(|_| destination.to_path_buf());
    match revealer.reveal(&absolute) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not open {}: {}", absolute.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingRevealer {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl Revealer for RecordingRevealer {
        fn reveal(&self, path: &Path) -> io::Result<()> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FailingRevealer;

    impl Revealer for FailingRevealer {
        fn reveal(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::other("no display"))
        }
    }

    #[test]
    fn test_reveals_absolute_destination_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();
        let revealer = Arc::new(RecordingRevealer::default());

        let report = Pipeline::new(PipelineConfig::default())
            .with_revealer(revealer.clone())
            .run(dir.path());

        let calls = revealer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_absolute());
        assert!(calls[0].ends_with(DEFAULT_DESTINATION));
        assert!(report.revealed);
        assert_eq!(report.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_no_reveal_without_duplicates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let revealer = Arc::new(RecordingRevealer::default());

        let report = Pipeline::new(PipelineConfig::default())
            .with_revealer(revealer.clone())
            .run(dir.path());

        assert!(revealer.calls.lock().unwrap().is_empty());
        assert!(matches!(report.outcome, RunOutcome::NoDuplicates));
        assert!(!report.destination.exists());
        assert_eq!(report.exit_code(), ExitCode::NoDuplicates);
    }

    #[test]
    fn test_reveal_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();

        let report = Pipeline::new(PipelineConfig::default())
            .with_revealer(Arc::new(FailingRevealer))
            .run(dir.path());

        assert!(!report.revealed);
        assert_eq!(report.moved_count(), 2);
    }

    #[test]
    fn test_dry_run_moves_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();

        let config = PipelineConfig {
            dry_run: true,
            ..PipelineConfig::default()
        };
        let report = Pipeline::new(config).run(dir.path());

        assert!(matches!(report.outcome, RunOutcome::DryRun));
        assert_eq!(report.duplicates_found(), 2);
        assert!(!report.destination.exists());
        assert!(dir.path().join("a").exists());
    }

    #[test]
    fn test_custom_destination_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();

        let config = PipelineConfig {
            destination: "quarantine".to_string(),
            ..PipelineConfig::default()
        };
        let report = Pipeline::new(config).run(dir.path());

        assert_eq!(report.destination, dir.path().join("quarantine"));
        assert!(dir.path().join("quarantine").join("a").exists());
    }

    #[test]
    fn test_destination_blocked_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();
        // A hidden regular file occupying the destination name
        fs::write(dir.path().join(".blocked"), b"file").unwrap();

        let config = PipelineConfig {
            destination: ".blocked".to_string(),
            ..PipelineConfig::default()
        };
        let report = Pipeline::new(config).run(dir.path());

        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::Destination(_))
        ));
        assert_eq!(report.exit_code(), ExitCode::GeneralError);
        assert!(dir.path().join("a").exists());
    }

    #[test]
    fn test_interrupt_before_moving_creates_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"x").unwrap();
        let revealer = Arc::new(RecordingRevealer::default());

        // Raised after detection finished, before the mover
        let flag = Arc::new(AtomicBool::new(true));
        let mut config = PipelineConfig::default();
        config.transfer = config.transfer.with_shutdown_flag(flag);
        let report = Pipeline::new(config)
            .with_revealer(revealer.clone())
            .run(dir.path());

        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::Scan(FinderError::Interrupted))
        ));
        assert_eq!(report.exit_code(), ExitCode::Interrupted);
        assert_eq!(report.duplicates_found(), 2);
        assert!(!report.destination.exists());
        assert!(dir.path().join("a").exists());
        assert!(dir.path().join("b").exists());
        assert!(revealer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_aborts() {
        let dir = TempDir::new().unwrap();
        let report = Pipeline::new(PipelineConfig::default()).run(&dir.path().join("nope"));

        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::Scan(FinderError::DirectoryAccess(_)))
        ));
        assert_eq!(report.files_considered, 0);
    }
}
