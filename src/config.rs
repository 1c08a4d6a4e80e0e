//! Configuration file handling and run settings.
//!
//! This module loads optional defaults from a TOML file and merges them
//! with the command line into an immutable [`Settings`] value.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/clocmail/config.toml`
//! - macOS: `~/Library/Application Support/clocmail/config.toml`
//! - Windows: `%APPDATA%\clocmail\config.toml`
//!
//! # Precedence
//!
//! Command-line flag, then environment variable (`CLOCMAIL_TO` and
//! friends), then this file, then the built-in default.
//!
//! # Example Configuration
//!
//! ```toml
//! to = "team@example.com"
//! from = "ci@example.com"
//! clone_dir = "/var/tmp/clones"
//! cloc_options = "--exclude-dir=vendor,node_modules"
//! package_manager = "apt"
//! escalate = "never"
//! ```

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::notify::{non_empty, Envelope};
use crate::package::{Escalation, PackageManagerKind};
use crate::platform;
use crate::source::{ScanMode, SourceItem};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Defaults read from the user's configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,

    /// Base directory for repository clones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<PathBuf>,

    /// Options for the counting tool. Split into arguments on whitespace;
    /// single or double quotes keep a value with spaces together.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloc_options: Option<String>,

    /// Treat the first address-like positional argument as the recipient.
    ///
    /// Default: true
    pub detect_recipient: bool,

    /// Skip detection and use this package manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    /// When to wrap installs in `sudo`: "auto", "always" or "never".
    pub escalate: Escalation,

    /// Where per-run log and output files go.
    ///
    /// Default: `<temp dir>/clocmail`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_dir: Option<PathBuf>,

    /// Counting tool executable.
    pub counter: String,

    /// Mail client executable.
    pub mail_client: String,

    /// Port probed for a running mail server.
    pub smtp_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            to: None,
            from: None,
            subject: None,
            cc: None,
            bcc: None,
            clone_dir: None,
            cloc_options: None,
            detect_recipient: true,
            package_manager: None,
            escalate: Escalation::Auto,
            run_dir: None,
            counter: "cloc".to_string(),
            mail_client: "mail".to_string(),
            smtp_port: 25,
        }
    }
}

impl Config {
    /// Loads the config file, or the defaults if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use clocmail::Config;
    ///
    /// let config = Config::load()?;
    /// if let Some(to) = &config.to {
    ///     println!("default recipient: {}", to);
    /// }
    /// # Ok::<(), clocmail::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Like [`Config::load`], from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_error = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        toml::from_str(&content).map_err(|e| config_error(e.to_string()))
    }

    /// Writes the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clocmail")
            .join("config.toml")
    }

    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// Everything a run needs, resolved once from flags, environment and
/// config file. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: ScanMode,
    pub sources: Vec<SourceItem>,
    pub envelope: Envelope,
    pub clone_dir: Option<PathBuf>,
    pub cloc_options: Vec<String>,
    pub clone_depth: Option<u32>,
    pub stdin_name: String,
    /// Per-user bin directories searched before `PATH`.
    pub search_dirs: Vec<PathBuf>,
    pub package_manager: Option<PackageManagerKind>,
    pub escalation: Escalation,
    pub install: bool,
    pub dry_run: bool,
    pub run_dir: PathBuf,
    pub counter: String,
    pub mail_client: String,
    pub smtp_port: u16,
}

impl Settings {
    /// Settings with built-in defaults for the given sources.
    pub fn new(sources: Vec<SourceItem>, envelope: Envelope) -> Self {
        let defaults = Config::default();
        Self {
            mode: sources.first().map(SourceItem::mode).unwrap_or_default(),
            sources,
            envelope,
            clone_dir: None,
            cloc_options: Vec::new(),
            clone_depth: None,
            stdin_name: "stdin.txt".to_string(),
            search_dirs: platform::user_bin_dirs(),
            package_manager: None,
            escalation: defaults.escalate,
            install: true,
            dry_run: false,
            run_dir: platform::run_dir(),
            counter: defaults.counter,
            mail_client: defaults.mail_client,
            smtp_port: defaults.smtp_port,
        }
    }

    /// Merges the command line (which already carries environment values)
    /// over the config file.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRecipient`] if no recipient can be found
    /// - [`Error::InvalidArguments`] if sources don't fit the scan mode
    /// - [`Error::UnsupportedManager`] for an unknown `package_manager`
    pub fn resolve(cli: Cli, config: Config) -> Result<Self> {
        let mode = cli.mode.scan_mode();
        let mut positionals = cli.sources;

        let detect = config.detect_recipient && !cli.no_detect_recipient;
        let to = non_empty(cli.to)
            .or_else(|| non_empty(config.to))
            .or_else(|| {
                if detect {
                    take_recipient(&mut positionals)
                } else {
                    None
                }
            })
            .ok_or(Error::MissingRecipient)?;

        match mode {
            ScanMode::Stdin if !positionals.is_empty() => {
                return Err(Error::InvalidArguments(format!(
                    "--stdin takes no sources, got: {}",
                    positionals.join(" ")
                )));
            }
            ScanMode::Repository | ScanMode::FileList if positionals.is_empty() => {
                return Err(Error::InvalidArguments(format!(
                    "no sources given for --{} mode",
                    mode
                )));
            }
            _ => {}
        }
        let sources = SourceItem::from_args(mode, &positionals);

        let subject = non_empty(cli.subject)
            .or_else(|| non_empty(config.subject))
            .unwrap_or_else(|| default_subject(&sources));
        let envelope = Envelope::new(to)?
            .with_from(cli.from.or(config.from))
            .with_subject(Some(subject))
            .with_cc(cli.cc.or(config.cc))
            .with_bcc(cli.bcc.or(config.bcc));

        let package_manager = config
            .package_manager
            .as_deref()
            .map(str::parse::<PackageManagerKind>)
            .transpose()?;

        let cloc_options = non_empty(cli.cloc_options)
            .or_else(|| non_empty(config.cloc_options))
            .map(|opts| split_options(&opts))
            .unwrap_or_default();

        Ok(Self {
            mode,
            sources,
            envelope,
            clone_dir: cli.clone_dir.or(config.clone_dir),
            cloc_options,
            clone_depth: cli.depth,
            stdin_name: cli.stdin_name,
            search_dirs: platform::user_bin_dirs(),
            package_manager,
            escalation: config.escalate,
            install: !cli.no_install,
            dry_run: cli.dry_run,
            run_dir: config.run_dir.unwrap_or_else(platform::run_dir),
            counter: config.counter,
            mail_client: config.mail_client,
            smtp_port: config.smtp_port,
        })
    }
}

/// Returns true for a plain address such as `dev@example.com`.
///
/// Values ending in `.git` are never addresses, so `me@host.git` stays a
/// repository.
pub fn looks_like_email(value: &str) -> bool {
    !value.ends_with(".git") && EMAIL_ADDRESS.is_match(value)
}

/// Removes and returns the first address-like argument.
fn take_recipient(args: &mut Vec<String>) -> Option<String> {
    let index = args.iter().position(|a| looks_like_email(a))?;
    Some(args.remove(index))
}

/// Splits counting tool options into arguments.
///
/// Words are separated by whitespace. Single or double quotes group a value
/// that contains spaces and are removed, so `--exclude-dir="a b"` stays one
/// argument, `--exclude-dir=a b`. An unterminated quote runs to the end.
fn split_options(options: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in options.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        args.push(current);
    }
    args
}

fn default_subject(sources: &[SourceItem]) -> String {
    let first = sources
        .first()
        .map(SourceItem::identity)
        .unwrap_or_default();
    match sources.len() {
        0 | 1 => format!("Lines of code report: {}", first),
        n => format!("Lines of code report: {} (+{} more)", first, n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["clocmail"];
        argv.extend(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn without_env(mut cli: Cli) -> Cli {
        // CLOCMAIL_* variables in the test environment must not leak in
        if std::env::var_os("CLOCMAIL_TO").is_some() {
            cli.to = None;
        }
        cli
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("dev@example.com"));
        assert!(looks_like_email("first.last+loc@mail.example.org"));
        assert!(!looks_like_email("git@github.com:org/repo.git"));
        assert!(!looks_like_email("me@host.git"));
        assert!(!looks_like_email("https://example.com/org/repo"));
        assert!(!looks_like_email("./src"));
    }

    #[test]
    fn test_recipient_from_flag() {
        let settings = Settings::resolve(
            cli(&["--to", "a@example.com", "https://example.com/org/repo.git"]),
            Config::default(),
        )
        .unwrap();
        assert_eq!(settings.envelope.to, "a@example.com");
        assert_eq!(settings.sources.len(), 1);
    }

    #[test]
    fn test_recipient_from_config() {
        let config = Config {
            to: Some("team@example.com".into()),
            ..Config::default()
        };
        let settings = Settings::resolve(
            without_env(cli(&["https://example.com/org/repo.git"])),
            config,
        )
        .unwrap();
        assert_eq!(settings.envelope.to, "team@example.com");
    }

    #[test]
    fn test_flag_beats_config() {
        let config = Config {
            to: Some("team@example.com".into()),
            from: Some("config@example.com".into()),
            ..Config::default()
        };
        let settings = Settings::resolve(
            cli(&["-t", "me@example.com", "-f", "flag@example.com", "repo"]),
            config,
        )
        .unwrap();
        assert_eq!(settings.envelope.to, "me@example.com");
        assert_eq!(settings.envelope.from.as_deref(), Some("flag@example.com"));
    }

    #[test]
    fn test_recipient_from_positional() {
        let settings = Settings::resolve(
            without_env(cli(&[
                "git@github.com:org/a.git",
                "dev@example.com",
                "https://example.com/org/b",
            ])),
            Config::default(),
        )
        .unwrap();
        assert_eq!(settings.envelope.to, "dev@example.com");
        assert_eq!(
            settings.sources,
            vec![
                SourceItem::Repository("git@github.com:org/a.git".into()),
                SourceItem::Repository("https://example.com/org/b".into()),
            ]
        );
    }

    #[test]
    fn test_positional_detection_opt_out() {
        let err = Settings::resolve(
            without_env(cli(&["--files", "--no-detect-recipient", "dev@example.com"])),
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingRecipient));

        let config = Config {
            detect_recipient: false,
            ..Config::default()
        };
        let err = Settings::resolve(without_env(cli(&["dev@example.com", "repo"])), config)
            .unwrap_err();
        assert!(matches!(err, Error::MissingRecipient));
    }

    #[test]
    fn test_missing_recipient() {
        let err = Settings::resolve(without_env(cli(&["--files", "src"])), Config::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingRecipient));
    }

    #[test]
    fn test_stdin_rejects_sources() {
        let err = Settings::resolve(cli(&["--stdin", "-t", "a@example.com", "x"]), Config::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_no_sources_is_invalid() {
        let err = Settings::resolve(cli(&["-t", "a@example.com"]), Config::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_stdin_settings() {
        let settings =
            Settings::resolve(cli(&["--stdin", "-t", "a@example.com"]), Config::default()).unwrap();
        assert_eq!(settings.mode, ScanMode::Stdin);
        assert_eq!(settings.sources, vec![SourceItem::Stdin]);
    }

    #[test]
    fn test_unsupported_package_manager() {
        let config = Config {
            package_manager: Some("emerge".into()),
            ..Config::default()
        };
        let err = Settings::resolve(cli(&["-t", "a@example.com", "repo"]), config).unwrap_err();
        assert!(matches!(err, Error::UnsupportedManager(_)));
    }

    #[test]
    fn test_cloc_options_split() {
        let settings = Settings::resolve(
            cli(&["-t", "a@example.com", "--cloc-options", " --quiet  --by-file ", "repo"]),
            Config::default(),
        )
        .unwrap();
        assert_eq!(settings.cloc_options, vec!["--quiet", "--by-file"]);
    }

    #[test]
    fn test_cloc_options_keep_quoted_values() {
        assert_eq!(
            split_options(r#"--exclude-dir="third party" --not-match-f='a b.rs' -q"#),
            vec!["--exclude-dir=third party", "--not-match-f=a b.rs", "-q"]
        );
        assert_eq!(split_options(r#"--x="" "#), vec!["--x="]);
        assert_eq!(split_options("--x='open ended"), vec!["--x=open ended"]);
        assert!(split_options("   ").is_empty());
    }

    #[test]
    fn test_default_subject() {
        let settings = Settings::resolve(
            cli(&["-t", "a@example.com", "--files", "src", "tests", "benches"]),
            Config::default(),
        )
        .unwrap();
        assert_eq!(
            settings.envelope.subject.as_deref(),
            Some("Lines of code report: src (+2 more)")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.detect_recipient);
        assert_eq!(config.counter, "cloc");
        assert_eq!(config.smtp_port, 25);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "to = \"team@example.com\"\nescalate = \"never\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.to.as_deref(), Some("team@example.com"));
        assert_eq!(config.escalate, Escalation::Never);
        assert_eq!(config.mail_client, "mail");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "smtp_port = \"twenty-five\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(err.exit_code(), crate::error::exit_codes::ERROR);
    }

    #[test]
    fn test_default_config_round_trips() {
        let text = Config::generate_default_config();
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.counter, "cloc");
        assert_eq!(config.escalate, Escalation::Auto);
    }
}
