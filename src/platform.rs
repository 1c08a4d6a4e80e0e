//! Host facts and probes.
//!
//! This module answers questions about the machine clocmail runs on:
//! where executables live, whether stdin is attached, whether a mail
//! server is already listening, and the identity strings written into the
//! report header.

use std::fs;
use std::io::IsTerminal;
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

/// Probes that depend on the live host environment.
pub trait Host {
    /// Looks an executable up on `PATH`.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Returns true if stdin is an interactive terminal rather than a pipe
    /// or file.
    fn stdin_is_terminal(&self) -> bool;

    /// Returns true if something accepts TCP connections on the given
    /// local port.
    fn is_port_listening(&self, port: u16) -> bool;
}

/// [`Host`] for the machine this process runs on.
pub struct SystemHost;

impl Host for SystemHost {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn stdin_is_terminal(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn is_port_listening(&self, port: u16) -> bool {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        TcpStream::connect_timeout(&addr, Duration::from_millis(500)).is_ok()
    }
}

/// Returns per-user directories that tools are commonly installed into
/// without a package manager.
///
/// - `~/.local/bin/`
/// - `~/bin/`
pub fn user_bin_dirs() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![home.join(".local").join("bin"), home.join("bin")]
}

/// Returns the directory holding per-run log and output files.
///
/// Location: `<temp dir>/clocmail/`, e.g. `/tmp/clocmail/` on Linux.
pub fn run_dir() -> PathBuf {
    std::env::temp_dir().join("clocmail")
}

/// Returns the host name, or `"unknown"`.
pub fn hostname() -> String {
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Returns an OS identification string.
///
/// Uses `PRETTY_NAME` from `/etc/os-release` where available, followed by
/// the target OS and architecture.
pub fn os_description() -> String {
    let base = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);
    match fs::read_to_string("/etc/os-release")
        .ok()
        .and_then(|content| pretty_name(&content))
    {
        Some(name) => format!("{} ({})", name, base),
        None => base,
    }
}

fn pretty_name(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?;
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Returns the name of the invoking user, or `"unknown"`.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
