//! Terminal output of a finished run.

mod cli;
mod json;

pub use cli::{print_cli_table, summary_table};
pub use json::print_json;

use crate::error::Error;
use crate::notify::SendOutcome;
use crate::report::Report;
use crate::runlog::RunFiles;
use std::io::{self, Write};

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::InvalidArguments(format!(
                "unknown format: {}. Use 'table' or 'json'",
                s
            ))),
        }
    }
}

pub fn print_summary(
    report: &Report,
    delivery: Option<&SendOutcome>,
    files: Option<&RunFiles>,
    format: OutputFormat,
) -> crate::error::Result<()> {
    match format {
        OutputFormat::Table => {
            print_cli_table(report, delivery, files);
            Ok(())
        }
        OutputFormat::Json => print_json(report),
    }
}

/// Writes the full report of a dry run.
///
/// The report goes to `out` alongside a table summary. With JSON output
/// it goes to `err` instead, so `out` holds nothing but the JSON document.
///
/// # Example
///
/// ```
/// use clocmail::output::{write_dry_run_report, OutputFormat};
/// use clocmail::report::{Report, RunMetadata};
///
/// let report = Report::begin(RunMetadata::collect(chrono::Local::now()));
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// write_dry_run_report(&report, OutputFormat::Json, &mut out, &mut err).unwrap();
/// assert!(out.is_empty());
/// assert!(String::from_utf8(err).unwrap().starts_with("Host:"));
/// ```
pub fn write_dry_run_report(
    report: &Report,
    format: OutputFormat,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    let target: &mut dyn Write = match format {
        OutputFormat::Table => &mut *out,
        OutputFormat::Json => &mut *err,
    };
    target.write_all(report.render().as_bytes())?;
    target.flush()
}
