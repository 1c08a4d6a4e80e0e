//! Package manager strategies and dependency bootstrapping.
//!
//! This module provides the [`PackageManager`] trait, one implementation per
//! supported manager, and the [`PackageResolver`] that uses the detected
//! manager to make sure the external tools clocmail drives are present.
//!
//! # Supported Managers
//!
//! Detection probes for each manager's executable in priority order; the
//! first one found is used for the whole run.
//!
//! | Priority | Manager | Executable | Query | Install |
//! |----------|---------|------------|-------|---------|
//! | 1 | [`AptManager`] | `apt-get` | `dpkg-query -W` | `apt-get install -y` |
//! | 2 | [`DnfManager`] | `dnf` | `rpm -q` | `dnf install -y` |
//! | 3 | [`YumManager`] | `yum` | `rpm -q` | `yum install -y` |
//! | 4 | [`PacmanManager`] | `pacman` | `pacman -Qi` | `pacman -S --noconfirm` |
//! | 5 | [`HomebrewManager`] | `brew` | `brew list` | `brew install` |

mod apt;
mod dnf;
mod homebrew;
mod pacman;
mod resolver;
mod spec;
mod yum;

pub use apt::AptManager;
pub use dnf::DnfManager;
pub use homebrew::HomebrewManager;
pub use pacman::PacmanManager;
pub use resolver::{detect_package_manager, Escalation, PackageResolver, Resolution};
pub use spec::{
    line_counter, mail_client, mail_transport, version_control, PackageSpec, Requirement,
    LINE_COUNTER, MAIL_CLIENT, MAIL_TRANSPORT_AGENT, VERSION_CONTROL,
};
pub use yum::YumManager;

use crate::error::Error;
use crate::process::{CommandOutput, CommandSpec};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManagerKind {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Homebrew,
}

impl PackageManagerKind {
    /// Detection order. The first manager whose executable is found wins.
    pub const PRIORITY: [PackageManagerKind; 5] = [
        PackageManagerKind::Apt,
        PackageManagerKind::Dnf,
        PackageManagerKind::Yum,
        PackageManagerKind::Pacman,
        PackageManagerKind::Homebrew,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManagerKind::Apt => "apt",
            PackageManagerKind::Dnf => "dnf",
            PackageManagerKind::Yum => "yum",
            PackageManagerKind::Pacman => "pacman",
            PackageManagerKind::Homebrew => "brew",
        }
    }

    /// The executable whose presence identifies this manager.
    pub fn executable(&self) -> &'static str {
        match self {
            PackageManagerKind::Apt => "apt-get",
            PackageManagerKind::Dnf => "dnf",
            PackageManagerKind::Yum => "yum",
            PackageManagerKind::Pacman => "pacman",
            PackageManagerKind::Homebrew => "brew",
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PackageManagerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apt" | "apt-get" => Ok(PackageManagerKind::Apt),
            "dnf" => Ok(PackageManagerKind::Dnf),
            "yum" => Ok(PackageManagerKind::Yum),
            "pacman" => Ok(PackageManagerKind::Pacman),
            "brew" | "homebrew" => Ok(PackageManagerKind::Homebrew),
            _ => Err(Error::UnsupportedManager(s.to_string())),
        }
    }
}

/// Commands for checking and installing packages with one manager.
pub trait PackageManager {
    fn kind(&self) -> PackageManagerKind;

    /// Command that asks whether `package` is installed.
    fn query_command(&self, package: &str) -> CommandSpec;

    /// Reads the answer to [`PackageManager::query_command`]. By default a
    /// zero exit status means installed.
    fn reports_installed(&self, output: &CommandOutput) -> bool {
        output.success()
    }

    /// Non-interactive install command for `package`.
    fn install_command(&self, package: &str) -> CommandSpec;

    /// Whether installs need root. Defaults to true.
    fn needs_privileges(&self) -> bool {
        true
    }
}

/// Returns the strategy for a manager.
pub fn get_manager(kind: PackageManagerKind) -> Box<dyn PackageManager> {
    match kind {
        PackageManagerKind::Apt => Box::new(AptManager),
        PackageManagerKind::Dnf => Box::new(DnfManager),
        PackageManagerKind::Yum => Box::new(YumManager),
        PackageManagerKind::Pacman => Box::new(PacmanManager),
        PackageManagerKind::Homebrew => Box::new(HomebrewManager),
    }
}
