//! Application configuration management.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config.toml` in the platform config directory, or `--config`)
//! 3. Environment variables prefixed with `DUPSWEEP_` (`__` separates nested keys)
//! 4. CLI flags (applied by [`crate::run_app`])
//!
//! ```toml
//! exclude_hidden = true
//! exclude_extensions = ["mp4", "mkv"]
//! io_threads = 8
//! destination = "duplicates"
//! hash_algorithm = "sha256"
//! on_hash_error = "abort"
//! reveal = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::pipeline::DEFAULT_DESTINATION;
use crate::scanner::{HashAlgorithm, HashErrorPolicy, DEFAULT_BUFFER_SIZE};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Skip files whose name starts with `.`.
    pub exclude_hidden: bool,
    /// Extensions to leave out of the scan.
    pub exclude_extensions: Vec<String>,
    /// Worker bound for stat, hash and move fan-out. `None` means CPUs × 2.
    pub io_threads: Option<usize>,
    /// Quarantine directory name inside the scanned directory.
    pub destination: String,
    /// Digest algorithm.
    pub hash_algorithm: HashAlgorithm,
    /// What to do when a file cannot be hashed.
    pub on_hash_error: HashErrorPolicy,
    /// Open the quarantine directory in the file browser afterwards.
    pub reveal: bool,
    /// Hash read chunk size in bytes.
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_hidden: true,
            exclude_extensions: Vec::new(),
            io_threads: None,
            destination: DEFAULT_DESTINATION.to_string(),
            hash_algorithm: HashAlgorithm::Sha256,
            on_hash_error: HashErrorPolicy::Abort,
            reveal: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Load from the default config file (if any) and the environment.
    ///
    /// Never fails: a broken file is logged and defaults are used.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Self::extract_or_default(Self::figment(None)),
        }
    }

    /// Load from a specific TOML file and the environment.
    ///
    /// A missing file is not an error.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        log::debug!("Loading configuration from {}", path.display());
        Self::extract_or_default(Self::figment(Some(path)))
    }

    /// Load from a specific TOML file and the environment, reporting errors.
    ///
    /// # Errors
    ///
    /// Returns the figment error for unparseable files or invalid values.
    pub fn try_load_from_path(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(Some(path)).extract()
    }

    /// The layered provider stack without CLI overrides.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract_or_default(figment: Figment) -> Self {
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
