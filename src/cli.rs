//! Command-line interface definitions for dupsweep.
//!
//! Every flag is optional; anything left unset falls back to the layered
//! configuration (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Sweep a directory
//! dupsweep ~/Downloads
//!
//! # Ask for the directory interactively
//! dupsweep
//!
//! # Preview only, machine-readable
//! dupsweep ~/Downloads --dry-run --output json
//!
//! # Leave videos alone, skip unreadable files
//! dupsweep ~/Downloads --exclude-ext mp4 --exclude-ext mkv --on-hash-error skip
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::output::OutputFormat;
use crate::scanner::{HashAlgorithm, HashErrorPolicy};

/// Prompt printed when no directory is given.
pub const DIRECTORY_PROMPT: &str = "Enter the directory: ";

/// Find files with identical content in one directory and move every copy
/// into a quarantine folder.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to sweep (prompted for when omitted)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Quarantine directory name, created inside PATH
    #[arg(short, long, value_name = "NAME")]
    pub destination: Option<String>,

    /// Include files whose name starts with `.`
    #[arg(long)]
    pub include_hidden: bool,

    /// Skip files with this extension (repeatable, case-insensitive)
    #[arg(short = 'x', long = "exclude-ext", value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Number of I/O threads (default: CPUs × 2, capped at the file count)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Content digest algorithm
    #[arg(long, value_enum, value_name = "ALGO")]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// What to do when a file cannot be read
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_hash_error: Option<HashErrorPolicy>,

    /// Hash read chunk size (e.g., 64KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub buffer_size: Option<u64>,

    /// Report what would be moved without touching anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not open the quarantine directory afterwards
    #[arg(long)]
    pub no_reveal: bool,
}

/// Errors from the interactive directory prompt.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The answer was empty.
    #[error("no directory given")]
    Empty,

    /// Reading or writing the terminal failed.
    #[error("cannot read directory from terminal: {0}")]
    Io(#[from] io::Error),
}

/// Ask for a directory on `output` and read one line from `input`.
///
/// Surrounding whitespace is trimmed.
///
/// # Errors
///
/// Returns [`PromptError::Empty`] for a blank answer or end of input.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::prompt_for_directory;
/// use std::path::PathBuf;
///
/// let mut out = Vec::new();
/// let dir = prompt_for_directory(&b"/tmp/photos\n"[..], &mut out).unwrap();
/// assert_eq!(dir, PathBuf::from("/tmp/photos"));
/// assert_eq!(out, b"Enter the directory: ");
/// ```
pub fn prompt_for_directory<R: BufRead, W: Write>(
    mut input: R,
    output: &mut W,
) -> Result<PathBuf, PromptError> {
    output.write_all(DIRECTORY_PROMPT.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let answer = line.trim();
    if answer.is_empty() {
        return Err(PromptError::Empty);
    }
    Ok(PathBuf::from(answer))
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
