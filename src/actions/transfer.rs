//! Quarantine transfers.
//!
//! # Overview
//!
//! This module moves duplicate files out of the scanned directory into the
//! quarantine directory:
//! - Same-volume moves link the file under its new name, then unlink the old
//!   one (a plain `rename` where the filesystem has no hard links)
//! - Cross-volume moves copy, verify, then delete the original
//! - Batches fan out on a bounded pool and report per-file failures
//!
//! # Safety
//!
//! Nothing is ever overwritten: a name that already exists in the
//! destination fails with [`TransferError::AlreadyExists`]. The name is
//! claimed with `hard_link`, which refuses an existing target atomically, so
//! a file another process drops into the destination mid-run is never
//! replaced. Only the rename fallback keeps a check-then-rename window. In the copy
//! fallback the original is removed only after the copy has the expected
//! length and has been flushed; any earlier failure removes the partial copy
//! and leaves the original in place.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::transfer::{ensure_destination, move_file};
//! use std::path::Path;
//!
//! let origin = Path::new("/photos");
//! let dest = origin.join("duplicates");
//! ensure_destination(&dest).unwrap();
//! match move_file(origin, &dest, "IMG_0001.jpg") {
//!     Ok(moved) => println!("Moved to {}", moved.to.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::pool::{run_bounded, worker_count};
use crate::progress::{ProgressCallback, PHASE_MOVING};
use crate::scanner::FileRecord;

/// `EXDEV` / `ERROR_NOT_SAME_DEVICE`
#[cfg(unix)]
const CROSS_DEVICE_OS_ERROR: i32 = 18;
#[cfg(windows)]
const CROSS_DEVICE_OS_ERROR: i32 = 17;
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE_OS_ERROR: i32 = -1;

/// Error type for transfer operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source file was not found (may have been moved or deleted).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied at the source or destination.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A file with the same name already exists in the destination.
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The cross-volume copy did not reproduce the whole file.
    #[error("incomplete copy of {path}: expected {expected} bytes, wrote {actual}")]
    CopyIncomplete {
        /// Source path
        path: PathBuf,
        /// Source length
        expected: u64,
        /// Bytes present in the copy
        actual: u64,
    },

    /// Shutdown was requested before this file was moved.
    #[error("transfer interrupted before moving {0}")]
    Interrupted(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Classify an I/O error raised for `path`.
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::AlreadyExists(p)
            | Self::Interrupted(p)
            | Self::CopyIncomplete { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// How a file reached the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// Link-then-unlink (or rename) on the same volume
    Rename,
    /// Copy, verify, delete original
    CopyThenDelete,
}

/// Result of a successful transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    /// File name (unchanged by the move)
    pub name: String,
    /// Original location
    pub from: PathBuf,
    /// New location inside the destination
    pub to: PathBuf,
    /// Size of the moved file in bytes
    pub size: u64,
    /// Mechanism used
    pub method: TransferMethod,
}

/// A transfer that failed.
#[derive(Debug)]
pub struct TransferFailure {
    /// File name
    pub name: String,
    /// Why it failed
    pub error: TransferError,
}

/// Results of a batch transfer.
#[derive(Debug, Default)]
pub struct BatchTransferResult {
    /// Successfully moved files, in input order.
    pub successes: Vec<TransferResult>,
    /// Failed moves, in input order.
    pub failures: Vec<TransferFailure>,
    /// Total bytes moved.
    pub bytes_moved: u64,
}

impl BatchTransferResult {
    /// Number of successful moves.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed moves.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempted moves.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all moves succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Moved {} file(s), {}",
                self.success_count(),
                ByteSize::b(self.bytes_moved)
            )
        } else {
            format!(
                "Moved {} file(s), {} failed, {}",
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_moved)
            )
        }
    }
}

/// Configuration for batch transfers.
#[derive(Clone, Default)]
pub struct TransferConfig {
    /// Upper bound on concurrent moves; `None` means CPUs × 2.
    pub io_threads: Option<usize>,
    /// Optional shutdown flag; pending moves fail with `Interrupted`.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl TransferConfig {
    /// Set the worker bound.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = Some(threads.max(1));
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

    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Create the destination directory and any missing parents.
///
/// Succeeds if the directory already exists.
///
/// # Errors
///
/// Returns [`TransferError`] if the directory cannot be created or the path
/// exists as something other than a directory.
pub fn ensure_destination(dest: &Path) -> Result<(), TransferError> {
    fs::create_dir_all(dest).map_err(|e| TransferError::from_io(dest, e))?;
    if !dest.is_dir() {
        return Err(TransferError::AlreadyExists(dest.to_path_buf()));
    }
    log::debug!("Destination ready: {}", dest.display());
    Ok(())
}

/// Move `origin/name` to `dest/name`.
///
/// # Errors
///
/// - `NotFound` if the source is gone
/// - `AlreadyExists` if the destination name is taken
/// - `CopyIncomplete` / `Io` if the cross-volume fallback fails
pub fn move_file(origin: &Path, dest: &Path, name: &str) -> Result<TransferResult, TransferError> {
    move_file_with(origin, dest, name, claim_name)
}

fn move_file_with<F>(
    origin: &Path,
    dest: &Path,
    name: &str,
    place: F,
) -> Result<TransferResult, TransferError>
where
    F: Fn(&Path, &Path) -> io::Result<()>,
{
    let from = origin.join(name);
    let to = dest.join(name);

    let size = fs::symlink_metadata(&from)
        .map_err(|e| TransferError::from_io(&from, e))?
        .len();

    if fs::symlink_metadata(&to).is_ok() {
        log::warn!("Refusing to overwrite {}", to.display());
        return Err(TransferError::AlreadyExists(to));
    }

    let method = match place(&from, &to) {
        Ok(()) => TransferMethod::Rename,
        Err(e) if is_cross_device(&e) => {
            log::debug!(
                "{} is on another volume, copying instead of renaming",
                to.display()
            );
            copy_then_remove(&from, &to, size)?;
            TransferMethod::CopyThenDelete
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::warn!("Refusing to overwrite {}", to.display());
            return Err(TransferError::AlreadyExists(to));
        }
        Err(e) => {
            log::error!("Move failed for {}: {}", from.display(), e);
            return Err(TransferError::from_io(&from, e));
        }
    };

    log::info!("Moved {} -> {}", from.display(), to.display());

    Ok(TransferResult {
        name: name.to_string(),
        from,
        to,
        size,
        method,
    })
}

/// Give `from` the name `to`, failing with `AlreadyExists` if `to` is taken.
///
/// Filesystems without hard links fall back to a checked `rename`.
fn claim_name(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from) {
                // Undo the link so the file keeps exactly one name
                if let Err(undo) = fs::remove_file(to) {
                    log::warn!("Could not remove link {}: {}", to.display(), undo);
                }
                return Err(e);
            }
            Ok(())
        }
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::AlreadyExists | io::ErrorKind::NotFound
            ) || is_cross_device(&e) =>
        {
            Err(e)
        }
        Err(e) => {
            log::debug!("Cannot link {}: {}, renaming instead", to.display(), e);
            if fs::symlink_metadata(to).is_ok() {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            fs::rename(from, to)
        }
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE_OS_ERROR)
}

/// Copy `from` to `to`, verify, then remove `from`.
///
/// The copy is written under a temporary name in the destination and only
/// renamed to its final name once its length matches `expected`.
pub(crate) fn copy_then_remove(from: &Path, to: &Path, expected: u64) -> Result<(), TransferError> {
    let partial = partial_path(to);

    let result = copy_verified(from, &partial, expected)
        .and_then(|()| claim_name(&partial, to).map_err(|e| TransferError::from_io(to, e)));

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&partial) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                log::warn!(
                    "Could not remove partial copy {}: {}",
                    partial.display(),
                    cleanup
                );
            }
        }
        return Err(e);
    }

    // The copy is complete; a failure here leaves both files in place
    fs::remove_file(from).map_err(|e| TransferError::from_io(from, e))
}

fn copy_verified(from: &Path, partial: &Path, expected: u64) -> Result<(), TransferError> {
    let copied = fs::copy(from, partial).map_err(|e| TransferError::from_io(from, e))?;

    File::open(partial)
        .and_then(|f| f.sync_all())
        .map_err(|e| TransferError::from_io(partial, e))?;

    let on_disk = fs::metadata(partial)
        .map_err(|e| TransferError::from_io(partial, e))?
        .len();

    if copied != expected || on_disk != expected {
        return Err(TransferError::CopyIncomplete {
            path: from.to_path_buf(),
            expected,
            actual: on_disk,
        });
    }
    Ok(())
}

fn partial_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}.dupsweep-partial"))
}

/// Move every record from `origin` into `dest`.
///
/// Moves run concurrently and independently; a failure never undoes other
/// successful moves. Results are reported in input order.
pub fn move_batch(
    records: &[FileRecord],
    origin: &Path,
    dest: &Path,
    config: &TransferConfig,
) -> BatchTransferResult {
    let total = records.len();
    let threads = worker_count(config.io_threads, total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_start(PHASE_MOVING, total);
    }
    log::info!(
        "Transferring {} files to {} using {} workers",
        total,
        dest.display(),
        threads
    );

    let outcomes: Vec<Result<TransferResult, TransferError>> = run_bounded(threads, || {
        records
            .par_iter()
            .enumerate()
            .map(|(idx, record)| {
                if config.is_shutdown_requested() {
                    return Err(TransferError::Interrupted(origin.join(&record.name)));
                }
                let outcome = move_file(origin, dest, &record.name);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_progress(idx + 1, &record.name);
                }
                outcome
            })
            .collect()
    });

    let mut result = BatchTransferResult::default();
    for (record, outcome) in records.iter().zip(outcomes) {
        match outcome {
            Ok(moved) => {
                result.bytes_moved += moved.size;
                result.successes.push(moved);
            }
            Err(error) => {
                log::warn!("Failed to move {}: {}", record.name, error);
                result.failures.push(TransferFailure {
                    name: record.name.clone(),
                    error,
                });
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_end(PHASE_MOVING);
    }
    log::info!("{}", result.summary());

    result
}
