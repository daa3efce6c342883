//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the dupsweep binary.
///
/// - 0: Success (duplicates found and quarantined, or listed in a dry run)
/// - 1: General error (fatal abort, nothing moved)
/// - 2: No duplicates found
/// - 3: Partial success (some transfers failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were found and handled.
    Success = 0,
    /// General error: the run aborted.
    GeneralError = 1,
    /// No duplicates: the scan completed but nothing repeats.
    NoDuplicates = 2,
    /// Partial success: some files could not be moved.
    PartialSuccess = 3,
    /// Interrupted: the run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self::from_message(format!("{err:#}"), exit_code)
    }

    /// Create a new structured error from a plain message.
    #[must_use]
    pub fn from_message(message: String, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message,
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
