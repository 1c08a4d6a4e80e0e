//! Per-run files.
//!
//! Each run writes a set of files sharing one timestamped stem under the
//! run directory (see [`crate::platform::run_dir`]):
//!
//! | File | Contents |
//! |------|----------|
//! | `<stem>.log` | tracing output at debug level |
//! | `<stem>.out` | the full, unfiltered report |
//! | `<stem>.err` | failures and counting tool stderr |
//! | `<stem>.json` | per-source outcome summary |

use crate::error::Result;
use crate::report::Report;
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Paths of one run's files. Only the directory exists after
/// [`RunFiles::create`]; the files are written as the run goes.
///
/// # Example
///
/// ```no_run
/// use clocmail::platform::run_dir;
/// use clocmail::runlog::RunFiles;
///
/// let files = RunFiles::create(&run_dir(), chrono::Local::now())?;
/// println!("log: {}", files.log.display());
/// # Ok::<(), clocmail::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RunFiles {
    /// Tracing output.
    pub log: PathBuf,
    /// Full report text.
    pub out: PathBuf,
    /// Failures and counting tool stderr.
    pub err: PathBuf,
    /// JSON summary.
    pub summary: PathBuf,
}

impl RunFiles {
    /// Creates the run directory and names this run's files.
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let stem = format!(
            "clocmail-{}-{}",
            started_at.format("%Y%m%d-%H%M%S"),
            std::process::id()
        );
        Ok(Self {
            log: dir.join(format!("{}.log", stem)),
            out: dir.join(format!("{}.out", stem)),
            err: dir.join(format!("{}.err", stem)),
            summary: dir.join(format!("{}.json", stem)),
        })
    }

    pub fn open_log(&self) -> Result<File> {
        Ok(File::create(&self.log)?)
    }

    /// Writes the report, its error transcript and the JSON summary.
    pub fn write_report(&self, report: &Report) -> Result<()> {
        fs::write(&self.out, report.render())?;
        fs::write(&self.err, report.error_transcript())?;
        let summary = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
        fs::write(&self.summary, summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::report::RunMetadata;
    use crate::source::SourceItem;

    #[test]
    fn test_files_share_timestamped_stem() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = RunMetadata::for_tests();
        let files = RunFiles::create(&dir.path().join("runs"), metadata.started_at).unwrap();

        assert!(dir.path().join("runs").is_dir());
        let name = files.out.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("clocmail-20261018-093000-"));
        assert_eq!(files.log.with_extension("out"), files.out);
        assert_eq!(files.err.with_extension("json"), files.summary);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let files = RunFiles::create(dir.path(), Local::now()).unwrap();
        let mut report = Report::begin(RunMetadata::for_tests());
        report.append_failure(
            &SourceItem::Path("/missing".into()),
            None,
            &SourceError::PathNotFound("/missing".into()),
        );

        files.write_report(&report).unwrap();

        let out = fs::read_to_string(&files.out).unwrap();
        assert!(out.contains("FAILED: File not found: /missing"));
        let err = fs::read_to_string(&files.err).unwrap();
        assert!(err.contains("File not found: /missing"));
        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.summary).unwrap()).unwrap();
        assert_eq!(summary["blocks"][0]["status"], "failed");
        assert_eq!(summary["metadata"]["user"], "ci");
    }
}
