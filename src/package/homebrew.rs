use super::{PackageManager, PackageManagerKind};
use crate::process::CommandSpec;

pub struct HomebrewManager;

impl PackageManager for HomebrewManager {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Homebrew
    }

    fn query_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("brew").args(["list", "--versions", package])
    }

    fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("brew")
            .env("HOMEBREW_NO_AUTO_UPDATE", "1")
            .args(["install", package])
    }

    // Homebrew refuses to run as root.
    fn needs_privileges(&self) -> bool {
        false
    }
}
