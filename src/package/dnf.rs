use super::{PackageManager, PackageManagerKind};
use crate::process::CommandSpec;

pub struct DnfManager;

impl PackageManager for DnfManager {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Dnf
    }

    fn query_command(&self, package: &str) -> CommandSpec {
        rpm_query(package)
    }

    fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("dnf").args(["install", "-y", package])
    }
}

/// `rpm -q --whatprovides`, so virtual names like `mailx` resolve too.
pub(super) fn rpm_query(package: &str) -> CommandSpec {
    CommandSpec::new("rpm").args(["-q", "--whatprovides", package])
}
