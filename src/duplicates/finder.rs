//! Duplicate finder: listing, hashing and grouping.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the read-only half of a sweep:
//! 1. **Listing** - regular files directly inside the directory
//! 2. **Hashing** - full-content digest of every eligible file, on a bounded pool
//! 3. **Grouping** - [`find_repeats`] then [`resolve`], single-threaded
//!
//! Each phase completes before the next starts. Hash results are put back
//! into listing order before grouping because the grouping pass is
//! order-dependent.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let scan = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("{} files considered", scan.summary.files_considered);
//! for record in &scan.duplicates {
//!     println!("{}  {}", record.digest, record.name);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{find_repeats, resolve};
use crate::pool::{run_bounded, worker_count};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_LISTING};
use crate::scanner::{
    hash_to_hex, list_files, FileRecord, HashError, HashErrorPolicy, Hasher, ScanConfig,
    ScanError,
};

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Upper bound on concurrent workers; `None` means CPUs × 2.
    pub io_threads: Option<usize>,
    /// Which listed files are hashed and what to do on hash failure.
    pub scan: ScanConfig,
    /// Digest algorithm and chunk size.
    pub hasher: Hasher,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("scan", &self.scan)
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the worker bound.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = Some(threads.max(1));
        self
    }

    /// Set the scan filter and error policy.
    #[must_use]
    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Set the hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from the detection phases.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files found in the directory
    pub files_listed: usize,
    /// Files hidden or matching an excluded extension
    pub files_excluded: usize,
    /// Files hashed successfully (the size of the FileSet)
    pub files_considered: usize,
    /// Files left out because hashing failed under [`HashErrorPolicy::Skip`]
    pub files_skipped: usize,
    /// Records that repeat an earlier digest
    pub repeats: usize,
    /// Records selected for quarantine
    pub duplicates: usize,
    /// Hash failures that were skipped
    pub skipped_errors: Vec<HashError>,
    /// Time spent listing
    pub list_duration: Duration,
    /// Time spent hashing
    pub hash_duration: Duration,
    /// Time spent grouping
    pub group_duration: Duration,
}

/// Output of a completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every hashed file in listing order
    pub files: Vec<FileRecord>,
    /// Every record whose digest occurs more than once, in listing order
    pub duplicates: Vec<FileRecord>,
    /// Statistics
    pub summary: ScanSummary,
}

impl ScanResult {
    /// Check whether any duplicate was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Errors that abort the detection phases.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The directory could not be listed.
    #[error("Cannot access directory: {0}")]
    DirectoryAccess(#[from] ScanError),

    /// A file could not be hashed and the policy is to abort.
    #[error("Cannot hash file: {0}")]
    HashComputation(#[from] HashError),
}

/// Per-file outcome of the hash phase.
enum HashOutcome {
    Hashed(String),
    Failed(HashError),
    Cancelled,
}

/// Duplicate finder that orchestrates listing, hashing and grouping.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find every file in `dir` whose content is duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if the directory cannot be listed, a file
    /// cannot be hashed under [`HashErrorPolicy::Abort`], or shutdown was
    /// requested. No partial results are returned.
    pub fn find_duplicates(&self, dir: &Path) -> Result<ScanResult, FinderError> {
        let mut summary = ScanSummary::default();

        // Listing
        let start = Instant::now();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_start(PHASE_LISTING, 0);
        }
        log::info!("Reading directory {}", dir.display());
        let listed = list_files(dir, worker_count(self.config.io_threads, usize::MAX));
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_end(PHASE_LISTING);
        }
        let listed = listed?;
        summary.list_duration = start.elapsed();
        summary.files_listed = listed.len();
        log::info!(
            "Listed {} regular files in {:?}",
            listed.len(),
            summary.list_duration
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let candidates: Vec<String> = listed
            .into_iter()
            .filter(|name| {
                let excluded = self.config.scan.is_excluded(name);
                if excluded {
                    log::debug!("Excluded from scan: {}", name);
                }
                !excluded
            })
            .collect();
        summary.files_excluded = summary.files_listed - candidates.len();

        // Hashing
        let start = Instant::now();
        let files = self.hash_all(dir, candidates, &mut summary)?;
        summary.hash_duration = start.elapsed();
        summary.files_considered = files.len();
        log::info!(
            "Hashed {} files in {:?}",
            files.len(),
            summary.hash_duration
        );

        // Grouping
        let start = Instant::now();
        let repeats = find_repeats(&files);
        summary.repeats = repeats.len();
        let duplicates = if repeats.is_empty() {
            Vec::new()
        } else {
            resolve(&files, &repeats)
        };
        summary.duplicates = duplicates.len();
        summary.group_duration = start.elapsed();
        log::info!(
            "Found {} duplicated files ({} repeats)",
            summary.duplicates,
            summary.repeats
        );

        Ok(ScanResult {
            files,
            duplicates,
            summary,
        })
    }

    /// Hash every candidate on a bounded pool and rebuild listing order.
    fn hash_all(
        &self,
        dir: &Path,
        candidates: Vec<String>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileRecord>, FinderError> {
        let total = candidates.len();
        let threads = worker_count(self.config.io_threads, total);
        let abort_on_error = self.config.scan.on_hash_error == HashErrorPolicy::Abort;
        let failed = AtomicBool::new(false);
        let hasher = self.config.hasher;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_start(PHASE_HASHING, total);
        }
        log::info!(
            "Hashing {} files with {} using {} workers",
            total,
            hasher.algorithm(),
            threads
        );

        let outcomes: Vec<HashOutcome> = run_bounded(threads, || {
            candidates
                .par_iter()
                .enumerate()
                .map(|(idx, name)| {
                    if self.config.is_shutdown_requested() || failed.load(Ordering::SeqCst) {
                        return HashOutcome::Cancelled;
                    }

                    let path: PathBuf = dir.join(name);
                    let outcome = match hasher.full_hash(&path) {
                        Ok(hash) => {
                            log::trace!("Hashed {}", path.display());
                            HashOutcome::Hashed(hash_to_hex(&hash))
                        }
                        Err(e) => {
                            if abort_on_error {
                                failed.store(true, Ordering::SeqCst);
                            }
                            HashOutcome::Failed(e)
                        }
                    };

                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_progress(idx + 1, name);
                    }
                    outcome
                })
                .collect()
        });

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_end(PHASE_HASHING);
        }

        // A fatal hash error takes precedence over cancellation it caused
        let mut first_error = None;
        let mut cancelled = false;
        let mut files = Vec::with_capacity(total);

        for (name, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                HashOutcome::Hashed(digest) => files.push(FileRecord::new(name, digest)),
                HashOutcome::Failed(e) if abort_on_error => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                HashOutcome::Failed(e) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    summary.files_skipped += 1;
                    summary.skipped_errors.push(e);
                }
                HashOutcome::Cancelled => cancelled = true,
            }
        }

        if let Some(e) = first_error {
            log::error!("Aborting scan: {}", e);
            return Err(FinderError::HashComputation(e));
        }
        if cancelled || self.config.is_shutdown_requested() {
            log::info!("Hashing interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        Ok(files)
    }
}
