//! Human-readable rendering of a sweep.

use std::io::{self, Write};

use yansi::Paint;

use crate::pipeline::{RunOutcome, RunReport};

/// Text renderer for a [`RunReport`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
}

impl<'a> TextOutput<'a> {
    /// Wrap a finished run.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    /// Write the report.
    ///
    /// Colour follows the global `yansi` switch.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;

        if let RunOutcome::Aborted(reason) = &report.outcome {
            writeln!(writer, "{} {}", "Aborted:".red().bold(), reason)?;
            return Ok(());
        }

        writeln!(
            writer,
            "Scanned {}: {} files considered ({} excluded, {} skipped)",
            report.directory.display(),
            report.files_considered,
            report.files_excluded,
            report.files_skipped
        )?;
        writeln!(writer, "Duplicates found: {}", report.duplicates_found().bold())?;

        let width = report
            .duplicates
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0);
        for record in &report.duplicates {
            writeln!(
                writer,
                "  {:<width$}  {}",
                record.name,
                record.digest.dim(),
                width = width
            )?;
        }

        match &report.outcome {
            RunOutcome::NoDuplicates => {
                writeln!(writer, "{}", "No duplicates, nothing moved.".green())?;
            }
            RunOutcome::DryRun => {
                writeln!(
                    writer,
                    "{} {} file(s) would be moved to {}",
                    "Dry run:".yellow().bold(),
                    report.duplicates_found(),
                    report.destination.display()
                )?;
            }
            RunOutcome::Completed(batch) => {
                let line = format!("{} -> {}", batch.summary(), report.destination.display());
                if batch.all_succeeded() {
                    writeln!(writer, "{}", line.green())?;
                } else {
                    writeln!(writer, "{}", line.yellow())?;
                    for failure in &batch.failures {
                        writeln!(writer, "  {} {}: {}", "!".red(), failure.name, failure.error)?;
                    }
                }
            }
            RunOutcome::Aborted(_) => {}
        }

        let t = &report.timings;
        writeln!(
            writer,
            "{}",
            format!(
                "list {} ms, hash {} ms, group {} ms, move {} ms",
                t.list.as_millis(),
                t.hash.as_millis(),
                t.group.as_millis(),
                t.transfer.as_millis()
            )
            .dim()
        )?;
        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
