//! The end-to-end run.
//!
//! Steps run strictly in sequence:
//!
//! 1. pick the package manager and make sure every external tool exists
//! 2. acquire and count each source into the report
//! 3. persist the report to the run files
//! 4. mail the report (skipped on a dry run)
//!
//! Step 1 fails fast. Steps 2 to 4 never fail the run because of a single
//! source or a mail error; those end up in the report and the outcome.

use crate::config::Settings;
use crate::error::Result;
use crate::notify::{Notifier, SendOutcome};
use crate::package::{
    line_counter, mail_client, mail_transport, version_control, PackageResolver, PackageSpec,
    Resolution, LINE_COUNTER, MAIL_CLIENT, VERSION_CONTROL,
};
use crate::platform::Host;
use crate::process::CommandRunner;
use crate::report::{Report, RunMetadata};
use crate::runlog::RunFiles;
use crate::source::{ScanMode, SourceDispatcher};
use std::path::Path;
use tracing::{info, warn};

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub resolutions: Vec<Resolution>,
    pub report: Report,
    /// `None` on a dry run.
    pub delivery: Option<SendOutcome>,
}

/// The full path to run for a dependency found outside `PATH`.
///
/// `resolutions` holds one entry per spec, in the same order.
fn program_for<'r>(
    name: &str,
    specs: &[PackageSpec],
    resolutions: &'r [Resolution],
) -> Option<&'r Path> {
    specs
        .iter()
        .zip(resolutions)
        .find(|(spec, _)| spec.name == name)
        .and_then(|(_, resolution)| resolution.program())
}

/// External tools this run needs, in bootstrap order.
pub fn required_packages(settings: &Settings) -> Vec<PackageSpec> {
    let mut specs = vec![line_counter(&settings.counter)];
    if settings.mode == ScanMode::Repository {
        specs.push(version_control());
    }
    if !settings.dry_run {
        specs.push(mail_client(&settings.mail_client));
        specs.push(mail_transport());
    }
    specs
}

/// Executes a run with the given settings.
///
/// # Errors
///
/// Only bootstrap errors are returned: no package manager, or a dependency
/// or mail transport that cannot be satisfied.
pub fn execute(
    settings: &Settings,
    runner: &dyn CommandRunner,
    host: &dyn Host,
    metadata: RunMetadata,
    files: Option<&RunFiles>,
    show_progress: bool,
) -> Result<RunOutcome> {
    let resolver = PackageResolver::from_settings(settings, runner, host)?;
    let specs = required_packages(settings);
    let resolutions = resolver.ensure_dependencies(&specs)?;
    let program = |name: &str| program_for(name, &specs, &resolutions);

    let mut report = Report::begin(metadata);
    let mut dispatcher = SourceDispatcher::new(settings, runner, host).with_progress(show_progress);
    if let Some(path) = program(LINE_COUNTER) {
        dispatcher = dispatcher.with_counter_program(path);
    }
    if let Some(path) = program(VERSION_CONTROL) {
        dispatcher = dispatcher.with_git_program(path);
    }
    dispatcher.run(&settings.sources, &mut report);
    info!(
        sources = report.blocks().len(),
        failed = report.failures(),
        "dispatch complete"
    );

    if let Some(files) = files {
        if let Err(e) = files.write_report(&report) {
            warn!(error = %e, path = %files.out.display(), "could not persist report");
        }
    }

    let delivery = if settings.dry_run {
        None
    } else {
        let client = program(MAIL_CLIENT)
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| settings.mail_client.clone());
        let notifier = Notifier::new(runner, client);
        Some(notifier.send(&report.mail_body(), &settings.envelope))
    };

    Ok(RunOutcome {
        resolutions,
        report,
        delivery,
    })
}
