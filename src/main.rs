use anyhow::Result;
use chrono::Local;
use clap::error::ErrorKind;
use clap::Parser;
use clocmail::{
    app,
    cli::Cli,
    config::{Config, Settings},
    error::exit_codes,
    notify::SendOutcome,
    output::{print_summary, write_dry_run_report, OutputFormat},
    platform::{self, SystemHost},
    process::SystemRunner,
    report::RunMetadata,
    runlog::RunFiles,
    source::ScanMode,
};
use std::fs::File;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => exit_codes::ERROR,
                _ => exit_codes::INVALID_ARGUMENTS,
            };
            return ExitCode::from(code);
        }
    };

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = e
                .downcast_ref::<clocmail::Error>()
                .map(clocmail::Error::exit_code)
                .unwrap_or(exit_codes::ERROR);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    if cli.config_path || cli.init_config {
        handle_config(cli.init_config)?;
        return Ok(exit_codes::SUCCESS);
    }

    let format = OutputFormat::from_str(&cli.format)?;
    let config = Config::load()?;
    let started_at = Local::now();

    let run_dir = config.run_dir.clone().unwrap_or_else(platform::run_dir);
    let files = match RunFiles::create(&run_dir, started_at) {
        Ok(files) => Some(files),
        Err(e) => {
            eprintln!("Warning: cannot create run files in {}: {}", run_dir.display(), e);
            None
        }
    };
    let log_file = files.as_ref().and_then(|f| f.open_log().ok());
    init_logging(cli.verbosity(), log_file);

    let settings = Settings::resolve(cli, config)?;
    info!(
        mode = %settings.mode,
        sources = settings.sources.len(),
        to = %settings.envelope.to,
        dry_run = settings.dry_run,
        "starting run"
    );

    let show_progress = format == OutputFormat::Table
        && settings.mode != ScanMode::Stdin
        && std::io::stderr().is_terminal();

    let outcome = app::execute(
        &settings,
        &SystemRunner,
        &SystemHost,
        RunMetadata::collect(started_at),
        files.as_ref(),
        show_progress,
    )?;

    if settings.dry_run {
        write_dry_run_report(
            &outcome.report,
            format,
            &mut std::io::stdout().lock(),
            &mut std::io::stderr().lock(),
        )?;
    }
    print_summary(
        &outcome.report,
        outcome.delivery.as_ref(),
        files.as_ref(),
        format,
    )?;

    if let Some(SendOutcome::Failed { code, message }) = &outcome.delivery {
        let status = code.map_or_else(|| "no exit code".to_string(), |c| c.to_string());
        warn!(status = %status, message = %message, "report was not mailed");
    }

    Ok(exit_codes::SUCCESS)
}

/// Stderr gets warnings by default, more with `-v`; `RUST_LOG` overrides.
/// The run's log file always gets debug output.
fn init_logging(verbosity: u8, log_file: Option<File>) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clocmail={}", default_level)));

    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .with(file_layer)
        .init();
}

fn handle_config(init: bool) -> Result<()> {
    let config_path = Config::config_path();

    if !init {
        println!("{}", config_path.display());
        return Ok(());
    }

    if config_path.exists() {
        println!("Config file already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default().save()?;
    println!("Created config file at: {}", config_path.display());
    println!();
    println!("Default configuration:");
    println!("{}", Config::generate_default_config());
    Ok(())
}
