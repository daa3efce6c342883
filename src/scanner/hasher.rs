//! Streaming file hasher.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing 256-bit content
//! digests with bounded memory: files are read in fixed-size chunks and fed
//! to the digest state, so peak memory does not depend on file size.
//!
//! Two algorithms are supported:
//! - SHA-256 (default)
//! - BLAKE3
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Hasher, HashAlgorithm};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_algorithm(HashAlgorithm::Blake3);
//! let hex = hasher.hash_hex(Path::new("photo.jpg")).unwrap();
//! assert_eq!(hex.len(), 64);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// A raw 256-bit digest.
pub type Hash = [u8; 32];

/// Default read chunk size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest chunk size accepted by [`Hasher::with_buffer_size`].
const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Largest chunk size accepted by [`Hasher::with_buffer_size`] (16 MiB).
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Digest algorithm used for content fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Incremental digest state for one file.
enum DigestState {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(state) => state.update(chunk),
            Self::Blake3(state) => {
                state.update(chunk);
            }
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Sha256(state) => state.finalize().into(),
            Self::Blake3(state) => *state.finalize().as_bytes(),
        }
    }
}

/// Content hasher.
///
/// Cheap to clone and share between worker threads; every call owns its own
/// file handle and digest state.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a SHA-256 hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size, clamped to 4 KiB..=16 MiB.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        if size > MAX_BUFFER_SIZE {
            log::warn!(
                "Buffer size {} exceeds the {} byte limit, using the limit",
                size,
                MAX_BUFFER_SIZE
            );
        }
        self.buffer_size = size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured chunk size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Compute the digest of a file's entire content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails
    /// part-way through.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        self.hash_reader(&mut file)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))
    }

    /// Compute the digest of a file and render it as lowercase hex.
    ///
    /// # Errors
    ///
    /// See [`Hasher::full_hash`].
    pub fn hash_hex(&self, path: &Path) -> Result<String, HashError> {
        self.full_hash(path).map(|hash| hash_to_hex(&hash))
    }

    /// Stream any reader through the digest.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<Hash> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0_u8; self.buffer_size];
        let mut total: u64 = 0;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        log::trace!("Hashed {} bytes with {}", total, self.algorithm);
        Ok(state.finalize())
    }
}

/// Render a digest as 64 lowercase hex characters.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;

    hash.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
