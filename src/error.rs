//! Error types.
//!
//! Two families of errors exist:
//!
//! - [`Error`] is fatal. It stops the run before any report is mailed and
//!   maps to a distinct process exit code via [`Error::exit_code`].
//! - [`SourceError`] belongs to a single source item. It is written into the
//!   report as a failure block and the run moves on to the next item.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes for each fatal error kind.
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const INVALID_ARGUMENTS: u8 = 2;
    pub const NO_PACKAGE_MANAGER: u8 = 3;
    pub const MISSING_DEPENDENCY: u8 = 4;
    pub const NO_MAIL_TRANSPORT: u8 = 5;
    pub const MISSING_RECIPIENT: u8 = 6;
}

/// Fatal, pre-flight errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("no supported package manager found (looked for: {})", .looked_for.join(", "))]
    NoPackageManager { looked_for: Vec<String> },

    #[error("unsupported package manager: {0} (use apt, dnf, yum, pacman or brew)")]
    UnsupportedManager(String),

    #[error("missing dependency '{name}' (tried: {})", .tried.join(", "))]
    MissingDependency { name: String, tried: Vec<String> },

    #[error("no mail transport agent available (tried: {}; nothing listening on port {port})", .tried.join(", "))]
    NoMailTransport { tried: Vec<String>, port: u16 },

    #[error("no recipient address: pass --to, set CLOCMAIL_TO or give an address as the first argument")]
    MissingRecipient,

    #[error("failed to load config '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidArguments(_) => exit_codes::INVALID_ARGUMENTS,
            Error::NoPackageManager { .. } | Error::UnsupportedManager(_) => {
                exit_codes::NO_PACKAGE_MANAGER
            }
            Error::MissingDependency { .. } => exit_codes::MISSING_DEPENDENCY,
            Error::NoMailTransport { .. } => exit_codes::NO_MAIL_TRANSPORT,
            Error::MissingRecipient => exit_codes::MISSING_RECIPIENT,
            Error::Config { .. } | Error::Io(_) => exit_codes::ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failure of a single source item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("directory '{}' already exists with a different remote than {requested_url}", .existing_path.display())]
    DirectoryMismatch {
        existing_path: PathBuf,
        requested_url: String,
    },

    #[error("File not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("no input on stdin (stdin is a terminal)")]
    NoStdin,

    #[error("git clone of {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    #[error("failed to run {program}: {message}")]
    Spawn { program: String, message: String },
}
