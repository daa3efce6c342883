//! Directory lister.
//!
//! # Overview
//!
//! [`list_files`] enumerates the entries directly under one directory (no
//! recursion) and keeps only those whose status says "regular file".
//! Directories, symbolic links, sockets and other special files are dropped.
//!
//! The per-entry status checks run concurrently on a bounded pool, but the
//! returned names keep the order the operating system listed them in. That
//! order is what later decides which copy of a duplicate is seen first.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::list_files;
//! use std::path::Path;
//!
//! let names = list_files(Path::new("/home/user/Downloads"), 8).unwrap();
//! println!("{} regular files", names.len());
//! ```

use std::fs;
use std::io;
use std::path::Path;

use rayon::prelude::*;

use super::ScanError;
use crate::pool::run_bounded;

/// Status of one listed entry after the file-type check.
#[derive(Debug)]
enum EntryKind {
    Regular,
    Other,
}

/// List the regular files directly inside `dir`, in listing order.
///
/// # Arguments
///
/// * `dir` - Directory to list
/// * `threads` - Upper bound on concurrent status checks
///
/// # Errors
///
/// Returns [`ScanError`] if `dir` is missing, is not a directory, cannot be
/// read, or an entry's status cannot be determined.
pub fn list_files(dir: &Path, threads: usize) -> Result<Vec<String>, ScanError> {
    let metadata = fs::metadata(dir).map_err(|e| ScanError::from_io(dir.to_path_buf(), e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = fs::read_dir(dir).map_err(|e| ScanError::from_io(dir.to_path_buf(), e))?;

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ScanError::from_io(dir.to_path_buf(), e))?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                log::warn!(
                    "Skipping entry with non UTF-8 name in {}: {:?}",
                    dir.display(),
                    raw
                );
            }
        }
    }

    log::debug!("Listed {} entries in {}", names.len(), dir.display());

    let kinds: Vec<Result<EntryKind, ScanError>> = run_bounded(threads, || {
        names
            .par_iter()
            .map(|name| classify(&dir.join(name)))
            .collect()
    });

    let mut files = Vec::with_capacity(names.len());
    for (name, kind) in names.into_iter().zip(kinds) {
        match kind? {
            EntryKind::Regular => files.push(name),
            EntryKind::Other => log::trace!("Not a regular file: {}", name),
        }
    }

    log::debug!("{} regular files in {}", files.len(), dir.display());
    Ok(files)
}

/// Check one entry without following symbolic links.
fn classify(path: &Path) -> Result<EntryKind, ScanError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_file() => Ok(EntryKind::Regular),
        Ok(_) => Ok(EntryKind::Other),
        // Removed between listing and stat
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Entry vanished during listing: {}", path.display());
            Ok(EntryKind::Other)
        }
        Err(e) => Err(ScanError::from_io(path.to_path_buf(), e)),
    }
}
