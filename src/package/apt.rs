use super::{PackageManager, PackageManagerKind};
use crate::process::{CommandOutput, CommandSpec};

/// Debian and Ubuntu.
///
/// `dpkg -s` succeeds for packages that were removed but still have config
/// files, so installed state is read from the `Status` field instead.
pub struct AptManager;

impl PackageManager for AptManager {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Apt
    }

    fn query_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package])
    }

    fn reports_installed(&self, output: &CommandOutput) -> bool {
        output.success() && output.stdout_str().trim() == "install ok installed"
    }

    fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .args(["install", "-y", "--no-install-recommends", package])
    }
}
