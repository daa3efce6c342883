//! JSON rendering of a sweep.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "directory": "/home/user/Downloads",
//!   "destination": "/home/user/Downloads/duplicates",
//!   "generated_at": "2024-05-01T12:00:00Z",
//!   "outcome": "completed",
//!   "groups": [
//!     { "digest": "2cf24dba...", "files": ["a.txt", "c.txt"] }
//!   ],
//!   "moved": [
//!     { "name": "a.txt", "from": "...", "to": "...", "size": 5, "method": "rename" }
//!   ],
//!   "failures": [],
//!   "summary": {
//!     "files_listed": 3,
//!     "files_considered": 3,
//!     "duplicates_found": 2,
//!     "moved": 2,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::TransferResult;
use crate::duplicates::group_by_digest;
use crate::pipeline::{RunOutcome, RunReport};

/// Files sharing one digest.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDigestGroup {
    /// Lowercase hex digest
    pub digest: String,
    /// File names in listing order
    pub files: Vec<String>,
}

/// A failed move.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// File name
    pub name: String,
    /// Error message
    pub error: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files found in the directory
    pub files_listed: usize,
    /// Files dropped by the hidden or extension filters
    pub files_excluded: usize,
    /// Files handed to the hasher
    pub files_considered: usize,
    /// Files left out after a hash error under the skip policy
    pub files_skipped: usize,
    /// Files selected for quarantine (every copy of a repeated digest)
    pub duplicates_found: usize,
    /// Files actually moved
    pub moved: usize,
    /// Files that failed to move
    pub failed: usize,
    /// Total size of the moved files
    pub bytes_moved: u64,
    /// Time spent listing the directory
    pub list_duration_ms: u64,
    /// Time spent hashing
    pub hash_duration_ms: u64,
    /// Time spent grouping digests
    pub group_duration_ms: u64,
    /// Time spent moving files
    pub transfer_duration_ms: u64,
    /// Whether the quarantine directory was opened
    pub revealed: bool,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build the summary from a finished run.
    #[must_use]
    pub fn from_report(report: &RunReport) -> Self {
        let exit_code = report.exit_code();
        let bytes_moved = match &report.outcome {
            RunOutcome::Completed(batch) => batch.bytes_moved,
            _ => 0,
        };
        Self {
            files_listed: report.files_listed,
            files_excluded: report.files_excluded,
            files_considered: report.files_considered,
            files_skipped: report.files_skipped,
            duplicates_found: report.duplicates_found(),
            moved: report.moved_count(),
            failed: report.failures().len(),
            bytes_moved,
            list_duration_ms: report.timings.list.as_millis() as u64,
            hash_duration_ms: report.timings.hash.as_millis() as u64,
            group_duration_ms: report.timings.group.as_millis() as u64,
            transfer_duration_ms: report.timings.transfer.as_millis() as u64,
            revealed: report.revealed,
            interrupted: exit_code == crate::error::ExitCode::Interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON document for one run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// The scanned directory
    pub directory: String,
    /// The quarantine directory
    pub destination: String,
    /// When the document was produced (RFC 3339)
    pub generated_at: DateTime<Utc>,
    /// `no_duplicates`, `completed`, `dry_run` or `aborted`
    pub outcome: &'static str,
    /// Why the run aborted, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    /// Duplicate files grouped by digest
    pub groups: Vec<JsonDigestGroup>,
    /// Completed moves, in listing order
    pub moved: Vec<TransferResult>,
    /// Failed moves, in listing order
    pub failures: Vec<JsonFailure>,
    /// Counts, timings and exit code
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document from a finished run.
    #[must_use]
    pub fn new(report: &RunReport) -> Self {
        let (outcome, abort_reason, moved) = match &report.outcome {
            RunOutcome::NoDuplicates => ("no_duplicates", None, Vec::new()),
            RunOutcome::DryRun => ("dry_run", None, Vec::new()),
            RunOutcome::Completed(batch) => ("completed", None, batch.successes.clone()),
            RunOutcome::Aborted(reason) => ("aborted", Some(reason.to_string()), Vec::new()),
        };

        Self {
            directory: report.directory.to_string_lossy().into_owned(),
            destination: report.destination.to_string_lossy().into_owned(),
            generated_at: Utc::now(),
            outcome,
            abort_reason,
            groups: group_by_digest(&report.duplicates)
                .into_iter()
                .map(|g| JsonDigestGroup {
                    digest: g.digest,
                    files: g.names,
                })
                .collect(),
            moved,
            failures: report
                .failures()
                .iter()
                .map(|f| JsonFailure {
                    name: f.name.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            summary: JsonSummary::from_report(report),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error (not expected for these types).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error (not expected for these types).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or write failure.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization failed
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to output failed
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
