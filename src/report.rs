//! Report assembly.
//!
//! A [`Report`] is an append-only sequence of text blocks: a header built
//! from [`RunMetadata`], then one [`SourceBlock`] per source item in the
//! order the items were processed.
//!
//! [`Report::render`] gives the full text, which is what gets persisted.
//! [`Report::mail_body`] is the same text with carriage returns removed
//! and git's percentage progress lines dropped.

use crate::error::SourceError;
use crate::platform;
use crate::process::CommandOutput;
use crate::source::{ScanMode, SourceItem};
use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches progress lines such as `Receiving objects:  45% (9/20)`.
static PROGRESS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}% \(\d+/\d+\)").expect("valid progress regex"));

/// Who ran the report, where, and when.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub hostname: String,
    pub os: String,
    pub user: String,
    pub working_dir: PathBuf,
    pub started_at: DateTime<Local>,
}

impl RunMetadata {
    pub fn collect(started_at: DateTime<Local>) -> Self {
        Self {
            hostname: platform::hostname(),
            os: platform::os_description(),
            user: platform::current_user(),
            working_dir: std::env::current_dir().unwrap_or_default(),
            started_at,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        use chrono::TimeZone;
        Self {
            hostname: "build-01".to_string(),
            os: "Debian GNU/Linux 12 (bookworm) (linux x86_64)".to_string(),
            user: "ci".to_string(),
            working_dir: PathBuf::from("/home/ci"),
            started_at: Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        }
    }
}

/// Outcome of one source item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlockStatus {
    /// The counting tool ran; its exit code is kept as reported.
    Counted { exit_code: Option<i32> },
    /// The item could not be acquired or counted.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceBlock {
    pub mode: ScanMode,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(flatten)]
    pub status: BlockStatus,
    /// Acquisition transcript followed by the counting tool's output.
    #[serde(skip)]
    pub output: String,
    #[serde(skip)]
    pub stderr: String,
}

impl SourceBlock {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, BlockStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    metadata: RunMetadata,
    blocks: Vec<SourceBlock>,
}

impl Report {
    pub fn begin(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            blocks: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[SourceBlock] {
        &self.blocks
    }

    pub fn failures(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_failure()).count()
    }

    pub fn append_source(
        &mut self,
        item: &SourceItem,
        local_path: Option<&Path>,
        transcript: &str,
        output: &CommandOutput,
    ) {
        let mut text = transcript.to_string();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&output.combined());

        self.blocks.push(SourceBlock {
            mode: item.mode(),
            identity: item.identity(),
            local_path: local_path.map(Path::to_path_buf),
            status: BlockStatus::Counted {
                exit_code: output.code,
            },
            output: text,
            stderr: output.stderr_str(),
        });
    }

    pub fn append_failure(&mut self, item: &SourceItem, local_path: Option<&Path>, error: &SourceError) {
        self.blocks.push(SourceBlock {
            mode: item.mode(),
            identity: item.identity(),
            local_path: local_path.map(Path::to_path_buf),
            status: BlockStatus::Failed {
                error: error.to_string(),
            },
            output: String::new(),
            stderr: String::new(),
        });
    }

    /// The complete report text.
    pub fn render(&self) -> String {
        let m = &self.metadata;
        let mut out = String::new();
        let _ = writeln!(out, "Host:      {}", m.hostname);
        let _ = writeln!(out, "OS:        {}", m.os);
        let _ = writeln!(out, "User:      {}", m.user);
        let _ = writeln!(out, "Directory: {}", m.working_dir.display());
        let _ = writeln!(out, "Date:      {}", m.started_at.to_rfc2822());

        for block in &self.blocks {
            out.push('\n');
            let _ = write!(out, "==> {}: {}", block.mode, block.identity);
            if let Some(path) = &block.local_path {
                if path.as_os_str() != block.identity.as_str() {
                    let _ = write!(out, " ({})", path.display());
                }
            }
            out.push('\n');

            match &block.status {
                BlockStatus::Counted { exit_code } => {
                    out.push_str(&block.output);
                    if !block.output.is_empty() && !block.output.ends_with('\n') {
                        out.push('\n');
                    }
                    if *exit_code != Some(0) {
                        let status = CommandOutput {
                            code: *exit_code,
                            ..CommandOutput::default()
                        }
                        .status_text();
                        let _ = writeln!(out, "(counting tool finished with {})", status);
                    }
                }
                BlockStatus::Failed { error } => {
                    let _ = writeln!(out, "FAILED: {}", error);
                }
            }
        }
        out
    }

    /// Report text as sent by mail.
    pub fn mail_body(&self) -> String {
        let text = self.render().replace('\r', "");
        let mut body = String::with_capacity(text.len());
        for line in text.lines().filter(|line| !PROGRESS_LINE.is_match(line)) {
            body.push_str(line);
            body.push('\n');
        }
        body
    }

    /// Error output of every block, for the run's error file.
    pub fn error_transcript(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            let text = match &block.status {
                BlockStatus::Failed { error } => format!("{}\n", error),
                BlockStatus::Counted { .. } if !block.stderr.is_empty() => block.stderr.clone(),
                BlockStatus::Counted { .. } => continue,
            };
            let _ = writeln!(out, "==> {}: {}", block.mode, block.identity);
            out.push_str(&text);
        }
        out
    }
}
