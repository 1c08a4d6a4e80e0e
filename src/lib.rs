pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod output;
pub mod package;
pub mod platform;
pub mod process;
pub mod report;
pub mod runlog;
pub mod source;

#[cfg(test)]
mod testing;

pub use app::{execute, RunOutcome};
pub use config::{Config, Settings};
pub use error::{Error, Result, SourceError};
pub use notify::{Envelope, SendOutcome};
pub use report::{Report, RunMetadata};
pub use source::{ScanMode, SourceItem};
