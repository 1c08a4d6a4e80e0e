//! Command-line definition.

use crate::source::ScanMode;
use clap::{ArgAction, Args, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clocmail")]
#[command(
    author,
    version,
    about = "Count lines of code in git repositories, local paths or stdin and email the report",
    after_help = "The recipient may also be given as the first argument that looks like an \
                  email address, e.g. `clocmail you@example.com https://example.com/org/repo.git`."
)]
pub struct Cli {
    #[command(flatten)]
    pub mode: ModeArgs,

    /// Base directory for repository clones
    #[arg(short = 'D', long, env = "CLOCMAIL_CLONE_DIR", value_name = "DIR")]
    pub clone_dir: Option<PathBuf>,

    /// Options for the counting tool, split on whitespace (quote values with spaces)
    #[arg(long, env = "CLOCMAIL_CLOC_OPTIONS", value_name = "OPTS", allow_hyphen_values = true)]
    pub cloc_options: Option<String>,

    /// Shallow-clone repositories to this many commits
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,

    /// File name the counting tool uses to pick a language for stdin
    #[arg(long, value_name = "NAME", default_value = "stdin.txt")]
    pub stdin_name: String,

    /// Recipient address
    #[arg(short, long, env = "CLOCMAIL_TO")]
    pub to: Option<String>,

    /// Sender address
    #[arg(short, long, env = "CLOCMAIL_FROM")]
    pub from: Option<String>,

    /// Email subject
    #[arg(short, long, env = "CLOCMAIL_SUBJECT")]
    pub subject: Option<String>,

    /// Carbon-copy recipients
    #[arg(short, long, env = "CLOCMAIL_CC")]
    pub cc: Option<String>,

    /// Blind carbon-copy recipients
    #[arg(short, long, env = "CLOCMAIL_BCC")]
    pub bcc: Option<String>,

    /// Never treat a positional argument as the recipient
    #[arg(long)]
    pub no_detect_recipient: bool,

    /// Only check for dependencies, never install them
    #[arg(long)]
    pub no_install: bool,

    /// Print the report instead of mailing it
    #[arg(long)]
    pub dry_run: bool,

    /// Run summary format (table, json)
    #[arg(long, default_value = "table")]
    pub format: String,

    /// More output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Debug output, same as -vv
    #[arg(long)]
    pub debug: bool,

    /// Print the config file path and exit
    #[arg(long)]
    pub config_path: bool,

    /// Write a default config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Repository URLs, or paths with --files
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,
}

/// Mutually exclusive scan mode flags.
#[derive(Debug, Default, Args)]
#[group(multiple = false)]
pub struct ModeArgs {
    /// Clone and count git repositories (default)
    #[arg(long, visible_alias = "repo")]
    pub git: bool,

    /// Count local files and directories
    #[arg(long)]
    pub files: bool,

    /// Count source read from stdin
    #[arg(long)]
    pub stdin: bool,
}

impl ModeArgs {
    pub fn scan_mode(&self) -> ScanMode {
        if self.files {
            ScanMode::FileList
        } else if self.stdin {
            ScanMode::Stdin
        } else {
            ScanMode::Repository
        }
    }
}

impl Cli {
    /// 0 = warnings only, 1 = info, 2 = debug.
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            2
        } else {
            self.verbose.min(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["clocmail"];
        argv.extend(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_mode_is_repository() {
        let cli = parse(&["https://example.com/org/repo.git"]);
        assert_eq!(cli.mode.scan_mode(), ScanMode::Repository);
        assert_eq!(cli.sources, vec!["https://example.com/org/repo.git"]);
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(parse(&["--repo"]).mode.scan_mode(), ScanMode::Repository);
        assert_eq!(parse(&["--files", "src"]).mode.scan_mode(), ScanMode::FileList);
        assert_eq!(parse(&["--stdin"]).mode.scan_mode(), ScanMode::Stdin);
    }

    #[test]
    fn test_modes_are_exclusive() {
        let err = Cli::try_parse_from(["clocmail", "--files", "--stdin"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cloc_options_accept_hyphen_values() {
        let cli = parse(&["--cloc-options", "--exclude-dir=vendor --quiet", "x"]);
        assert_eq!(cli.cloc_options.as_deref(), Some("--exclude-dir=vendor --quiet"));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&[]).verbosity(), 0);
        assert_eq!(parse(&["-v"]).verbosity(), 1);
        assert_eq!(parse(&["-vv"]).verbosity(), 2);
        assert_eq!(parse(&["-vvv"]).verbosity(), 2);
        assert_eq!(parse(&["--debug"]).verbosity(), 2);
    }

    #[test]
    fn test_envelope_short_flags() {
        let cli = parse(&["-t", "a@x.org", "-f", "b@x.org", "-s", "LOC", "-c", "c@x.org", "-b", "d@x.org"]);
        assert_eq!(cli.to.as_deref(), Some("a@x.org"));
        assert_eq!(cli.from.as_deref(), Some("b@x.org"));
        assert_eq!(cli.subject.as_deref(), Some("LOC"));
        assert_eq!(cli.cc.as_deref(), Some("c@x.org"));
        assert_eq!(cli.bcc.as_deref(), Some("d@x.org"));
    }

    #[test]
    fn test_depth_must_be_positive() {
        assert!(Cli::try_parse_from(["clocmail", "--depth", "0"]).is_err());
        assert_eq!(parse(&["--depth", "1"]).depth, Some(1));
    }
}
