use super::{PackageManager, PackageManagerKind};
use crate::process::CommandSpec;

pub struct PacmanManager;

impl PackageManager for PacmanManager {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Pacman
    }

    fn query_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("pacman").args(["-Qi", package])
    }

    fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("pacman").args(["-S", "--noconfirm", "--needed", package])
    }
}
