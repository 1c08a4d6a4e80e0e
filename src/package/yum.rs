use super::dnf::rpm_query;
use super::{PackageManager, PackageManagerKind};
use crate::process::CommandSpec;

pub struct YumManager;

impl PackageManager for YumManager {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Yum
    }

    fn query_command(&self, package: &str) -> CommandSpec {
        rpm_query(package)
    }

    fn install_command(&self, package: &str) -> CommandSpec {
        CommandSpec::new("yum").args(["install", "-y", package])
    }
}
