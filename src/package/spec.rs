use super::PackageManagerKind;

/// How a [`PackageSpec`] is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// An executable, found on disk or provided by one of the packages.
    Executable,
    /// Any mail transport agent: one of the packages installed, or a
    /// server already listening on the SMTP port.
    MailTransport,
}

pub const LINE_COUNTER: &str = "line-counter";
pub const VERSION_CONTROL: &str = "version-control";
pub const MAIL_CLIENT: &str = "mail-client";
pub const MAIL_TRANSPORT_AGENT: &str = "mail-transport-agent";

/// A logical dependency and the package names that provide it.
///
/// The first package name for a manager is the primary one; the rest are
/// alternates tried in order when the primary cannot be installed.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    pub name: String,
    pub binary: Option<String>,
    pub requirement: Requirement,
    default_packages: Vec<String>,
    overrides: Vec<(PackageManagerKind, Vec<String>)>,
}

impl PackageSpec {
    pub fn executable(name: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binary: Some(binary.into()),
            requirement: Requirement::Executable,
            default_packages: Vec::new(),
            overrides: Vec::new(),
        }
    }

    pub fn mail_transport_agent() -> Self {
        Self {
            name: MAIL_TRANSPORT_AGENT.to_string(),
            binary: None,
            requirement: Requirement::MailTransport,
            default_packages: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Appends a package name used by every manager without an override.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.default_packages.push(package.into());
        self
    }

    /// Sets the package names for one manager.
    pub fn packages_for(mut self, kind: PackageManagerKind, packages: &[&str]) -> Self {
        self.overrides.retain(|(k, _)| *k != kind);
        self.overrides
            .push((kind, packages.iter().map(|p| p.to_string()).collect()));
        self
    }

    /// Package names to try with the given manager, primary first.
    pub fn packages(&self, kind: PackageManagerKind) -> &[String] {
        self.overrides
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, packages)| packages.as_slice())
            .unwrap_or(&self.default_packages)
    }
}

/// The counting tool. Its package is named after its executable.
pub fn line_counter(binary: &str) -> PackageSpec {
    PackageSpec::executable(LINE_COUNTER, binary).package(binary)
}

pub fn version_control() -> PackageSpec {
    PackageSpec::executable(VERSION_CONTROL, "git").package("git")
}

/// The `mail` command. Distributions ship it under different names.
pub fn mail_client(binary: &str) -> PackageSpec {
    PackageSpec::executable(MAIL_CLIENT, binary)
        .package("mailutils")
        .packages_for(PackageManagerKind::Apt, &["mailutils", "bsd-mailx"])
        .packages_for(PackageManagerKind::Dnf, &["s-nail", "mailx"])
        .packages_for(PackageManagerKind::Yum, &["mailx", "s-nail"])
        .packages_for(PackageManagerKind::Pacman, &["s-nail", "mailutils"])
}

pub fn mail_transport() -> PackageSpec {
    PackageSpec::mail_transport_agent()
        .package("postfix")
        .package("sendmail")
        .packages_for(
            PackageManagerKind::Apt,
            &["postfix", "exim4", "sendmail", "nullmailer"],
        )
        .packages_for(PackageManagerKind::Dnf, &["postfix", "sendmail", "exim"])
        .packages_for(PackageManagerKind::Yum, &["postfix", "sendmail", "exim"])
        .packages_for(PackageManagerKind::Pacman, &["postfix", "opensmtpd", "exim"])
        .packages_for(PackageManagerKind::Homebrew, &[])
}
