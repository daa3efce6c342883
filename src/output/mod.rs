//! Output formatters for sweep results.
//!
//! - Text for people, coloured with `yansi`
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::output::{write_report, OutputFormat};
//! use dupsweep::pipeline::{Pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! let report = Pipeline::new(PipelineConfig::default()).run(Path::new("."));
//! write_report(&report, OutputFormat::Json, &mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::Write;

use clap::ValueEnum;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

use crate::pipeline::RunReport;

/// Output format for sweep results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Write `report` to `writer` in the requested format.
///
/// # Errors
///
/// Returns an error on serialization or write failure.
pub fn write_report<W: Write>(
    report: &RunReport,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), JsonOutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(report).write_to(writer, true)?,
    }
    Ok(())
}
