use crate::notify::SendOutcome;
use crate::report::{BlockStatus, Report};
use crate::runlog::RunFiles;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Per-source outcome table.
pub fn summary_table(report: &Report) -> String {
    let rows: Vec<SourceRow> = report
        .blocks()
        .iter()
        .map(|b| SourceRow {
            mode: b.mode.to_string(),
            source: truncate(&b.identity, 50),
            path: b
                .local_path
                .as_ref()
                .map(|p| truncate(&p.display().to_string(), 40))
                .unwrap_or_else(|| "-".to_string()),
            result: match &b.status {
                BlockStatus::Counted { exit_code: Some(0) } => "counted".to_string(),
                BlockStatus::Counted { exit_code: Some(code) } => format!("counted (exit {})", code),
                BlockStatus::Counted { exit_code: None } => "counted (killed)".to_string(),
                BlockStatus::Failed { error } => truncate(error, 60),
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn print_cli_table(report: &Report, delivery: Option<&SendOutcome>, files: Option<&RunFiles>) {
    println!();
    if report.blocks().is_empty() {
        println!("No sources processed.");
    } else {
        println!("{}", summary_table(report));
    }

    println!();
    println!("Summary:");
    println!(
        "  Sources: {} ({} failed)",
        report.blocks().len(),
        report.failures()
    );
    match delivery {
        Some(SendOutcome::Sent) => println!("  Mail: sent"),
        Some(SendOutcome::Failed { code: Some(code), .. }) => {
            println!("  Mail: FAILED (mail client exit code {})", code)
        }
        Some(SendOutcome::Failed { code: None, message }) => {
            println!("  Mail: FAILED ({})", message)
        }
        None => println!("  Mail: not sent (dry run)"),
    }
    if let Some(files) = files {
        println!("  Report: {}", files.out.display());
        println!("  Log: {}", files.log.display());
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
