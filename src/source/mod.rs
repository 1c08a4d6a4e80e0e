//! Source acquisition and counting.
//!
//! A run scans a list of [`SourceItem`]s, all of one [`ScanMode`]:
//!
//! | Mode | Item | Acquisition |
//! |------|------|-------------|
//! | [`ScanMode::Repository`] | repository URL | clone, or reuse a matching clone |
//! | [`ScanMode::FileList`] | file or directory | check that it exists |
//! | [`ScanMode::Stdin`] | stdin | check that stdin is not a terminal |
//!
//! The [`SourceDispatcher`] acquires each item in input order, runs the
//! counting tool on it and appends the result to the [`Report`]. A failing
//! item is recorded in the report and does not stop the run.

mod counter;
mod files;
mod repository;
mod stdin;

pub use counter::Counter;
pub use repository::{clone_path, derive_directory_name, urls_match};

use crate::config::Settings;
use crate::error::SourceError;
use crate::platform::Host;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::report::Report;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// How source content is acquired before counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ScanMode {
    #[default]
    #[serde(rename = "git")]
    Repository,
    #[serde(rename = "files")]
    FileList,
    #[serde(rename = "stdin")]
    Stdin,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Repository => "git",
            ScanMode::FileList => "files",
            ScanMode::Stdin => "stdin",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One input to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Repository(String),
    Path(PathBuf),
    Stdin,
}

impl SourceItem {
    /// Builds the items for a mode from the positional arguments.
    pub fn from_args(mode: ScanMode, args: &[String]) -> Vec<SourceItem> {
        match mode {
            ScanMode::Repository => args.iter().cloned().map(SourceItem::Repository).collect(),
            ScanMode::FileList => args.iter().map(|a| SourceItem::Path(PathBuf::from(a))).collect(),
            ScanMode::Stdin => vec![SourceItem::Stdin],
        }
    }

    pub fn mode(&self) -> ScanMode {
        match self {
            SourceItem::Repository(_) => ScanMode::Repository,
            SourceItem::Path(_) => ScanMode::FileList,
            SourceItem::Stdin => ScanMode::Stdin,
        }
    }

    /// The item as the user gave it.
    pub fn identity(&self) -> String {
        match self {
            SourceItem::Repository(url) => url.clone(),
            SourceItem::Path(path) => path.display().to_string(),
            SourceItem::Stdin => "-".to_string(),
        }
    }
}

/// What the counting tool runs against.
enum Target {
    Path(PathBuf),
    Stdin,
}

/// An acquired item: the counting target plus any output the acquisition
/// step produced (e.g. clone progress).
struct Acquired {
    target: Target,
    transcript: String,
}

impl Acquired {
    fn path(path: PathBuf) -> Self {
        Self {
            target: Target::Path(path),
            transcript: String::new(),
        }
    }

    fn local_path(&self) -> Option<&Path> {
        match &self.target {
            Target::Path(path) => Some(path),
            Target::Stdin => None,
        }
    }
}

/// Acquires each source and counts it, appending results to a report.
///
/// # Example
///
/// ```no_run
/// use clocmail::platform::SystemHost;
/// use clocmail::process::SystemRunner;
/// use clocmail::{Envelope, Report, RunMetadata, Settings, SourceItem};
/// use clocmail::source::SourceDispatcher;
///
/// let items = vec![SourceItem::Repository("https://example.com/org/repo.git".into())];
/// let settings = Settings::new(items, Envelope::new("ops@example.com")?);
/// let mut report = Report::begin(RunMetadata::collect(chrono::Local::now()));
/// SourceDispatcher::new(&settings, &SystemRunner, &SystemHost)
///     .run(&settings.sources, &mut report);
/// print!("{}", report.render());
/// # Ok::<(), clocmail::Error>(())
/// ```
pub struct SourceDispatcher<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    host: &'a dyn Host,
    counter: Counter,
    git: String,
    show_progress: bool,
}

impl<'a> SourceDispatcher<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn CommandRunner, host: &'a dyn Host) -> Self {
        Self {
            settings,
            runner,
            host,
            counter: Counter::from_settings(settings),
            git: "git".to_string(),
            show_progress: false,
        }
    }

    /// Runs the counting tool from `path` instead of looking it up on `PATH`.
    pub fn with_counter_program(mut self, path: &Path) -> Self {
        self.counter = self.counter.with_program(path.to_string_lossy());
        self
    }

    /// Runs git from `path` instead of looking it up on `PATH`.
    pub fn with_git_program(mut self, path: &Path) -> Self {
        self.git = path.to_string_lossy().into_owned();
        self
    }

    /// Shows a spinner on stderr while cloning or counting.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Processes `items` in order, one at a time.
    ///
    /// Never fails: per-item errors become failure blocks in the report.
    pub fn run(&self, items: &[SourceItem], report: &mut Report) {
        for item in items {
            let local_path = self.local_path(item);
            match self.process(item) {
                Ok((acquired, output)) => {
                    info!(source = %item.identity(), status = %output.status_text(), "counted");
                    report.append_source(item, acquired.local_path(), &acquired.transcript, &output);
                }
                Err(e) => {
                    warn!(source = %item.identity(), error = %e, "source failed");
                    report.append_failure(item, local_path.as_deref(), &e);
                    if *item == SourceItem::Stdin {
                        break;
                    }
                }
            }
        }
    }

    fn local_path(&self, item: &SourceItem) -> Option<PathBuf> {
        match item {
            SourceItem::Repository(url) => Some(clone_path(self.settings.clone_dir.as_deref(), url)),
            SourceItem::Path(path) => Some(path.clone()),
            SourceItem::Stdin => None,
        }
    }

    fn process(&self, item: &SourceItem) -> Result<(Acquired, CommandOutput), SourceError> {
        let acquired = match item {
            SourceItem::Repository(url) => {
                let dir = clone_path(self.settings.clone_dir.as_deref(), url);
                let spinner = self.spinner(format!("Cloning {}...", url));
                let result = repository::acquire(self.runner, &self.git, url, &dir, self.settings.clone_depth);
                finish(spinner);
                result?
            }
            SourceItem::Path(path) => files::acquire(path)?,
            SourceItem::Stdin => stdin::acquire(self.host)?,
        };

        let command = match &acquired.target {
            Target::Path(path) => self.counter.command_for_path(path),
            Target::Stdin => self.counter.command_for_stdin(),
        };
        // Stdin may be a pipe the counting tool reads from, so no spinner.
        let spinner = match acquired.target {
            Target::Path(_) => self.spinner(format!("Counting {}...", item.identity())),
            Target::Stdin => None,
        };
        let output = run_tool(self.runner, &command);
        finish(spinner);

        Ok((acquired, output?))
    }

    fn spinner(&self, message: String) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(message);
        Some(pb)
    }
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Runs a tool, mapping a spawn failure to [`SourceError::Spawn`].
fn run_tool(runner: &dyn CommandRunner, command: &CommandSpec) -> Result<CommandOutput, SourceError> {
    runner.run(command).map_err(|e| SourceError::Spawn {
        program: command.program.clone(),
        message: e.to_string(),
    })
}
