//! Scanner module for directory listing and content hashing.
//!
//! This module provides functionality for:
//! - Listing the regular files directly inside one directory
//! - Content hashing with SHA-256 or BLAKE3 (streaming)
//! - Hidden-file and extension exclusion
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`lister`]: Directory enumeration and regular-file filtering
//! - [`hasher`]: Streaming file hashing
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{list_files, Hasher, ScanConfig};
//! use std::path::Path;
//!
//! let dir = Path::new(".");
//! let config = ScanConfig::default();
//! let hasher = Hasher::new();
//!
//! for name in list_files(dir, 4).unwrap() {
//!     if config.is_excluded(&name) {
//!         continue;
//!     }
//!     let digest = hasher.hash_hex(&dir.join(&name)).unwrap();
//!     println!("{digest}  {name}");
//! }
//! ```

pub mod hasher;
pub mod lister;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{
    hash_to_hex, Hash, HashAlgorithm, Hasher, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE,
};
pub use lister::list_files;

/// One hashed file found directly inside the target directory.
///
/// Created once per eligible file and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name relative to the scanned directory (no separators)
    pub name: String,
    /// Lowercase hexadecimal rendering of the 256-bit content digest
    pub digest: String,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(name: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
        }
    }
}

/// What to do when a single file cannot be hashed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashErrorPolicy {
    /// Abort the whole run; nothing is moved.
    #[default]
    Abort,
    /// Log a warning and leave the file out of the scan.
    Skip,
}

/// Configuration for which listed files get hashed.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Skip files whose name begins with `.`.
    pub exclude_hidden: bool,

    /// Extensions (without the leading dot) to skip, compared case-insensitively.
    pub exclude_extensions: Vec<String>,

    /// Behaviour on a per-file hash failure.
    pub on_hash_error: HashErrorPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_hidden: true,
            exclude_extensions: Vec::new(),
            on_hash_error: HashErrorPolicy::Abort,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration.
    ///
    /// Extensions are normalised: a leading `.` is dropped and the value is
    /// lowercased, so `".MP4"` and `"mp4"` are equivalent.
    #[must_use]
    pub fn new(
        exclude_hidden: bool,
        exclude_extensions: Vec<String>,
        on_hash_error: HashErrorPolicy,
    ) -> Self {
        let exclude_extensions = exclude_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            exclude_hidden,
            exclude_extensions,
            on_hash_error,
        }
    }

    /// Check whether a listed file name is kept out of the scan.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        if self.exclude_hidden && name.starts_with('.') {
            return true;
        }
        if self.exclude_extensions.is_empty() {
            return false;
        }
        let lowered = name.to_lowercase();
        self.exclude_extensions.iter().any(|ext| {
            lowered
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }
}

/// Errors that can occur while listing the target directory.
///
/// Any of these aborts the run before hashing starts.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when reading the directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while listing or stat-ing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The file disappeared between listing and hashing.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io {
                path,
                source: Arc::new(err),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
