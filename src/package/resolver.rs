use super::{get_manager, PackageManager, PackageManagerKind, PackageSpec, Requirement};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::platform::{user_bin_dirs, Host};
use crate::process::{CommandRunner, CommandSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// When installs are wrapped in `sudo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escalation {
    /// Use `sudo` if it exists and we are not already root.
    #[default]
    Auto,
    Always,
    Never,
}

/// How a dependency was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The executable is on `PATH` at this location.
    Found(PathBuf),
    /// The executable exists in a per-user bin directory that may not be on
    /// `PATH`. Callers must run it by this full path.
    InUserDir(PathBuf),
    /// The package manager reports the package as installed.
    AlreadyInstalled(String),
    /// The package was installed during this run.
    Installed(String),
    /// A mail server is listening on this local port.
    Listening(u16),
}

impl Resolution {
    /// The path a caller has to invoke instead of the bare executable name,
    /// if any.
    ///
    /// # Example
    ///
    /// ```
    /// use clocmail::package::Resolution;
    /// use std::path::{Path, PathBuf};
    ///
    /// let local = Resolution::InUserDir(PathBuf::from("/home/ci/.local/bin/cloc"));
    /// assert_eq!(local.program(), Some(Path::new("/home/ci/.local/bin/cloc")));
    /// assert_eq!(Resolution::Installed("cloc".into()).program(), None);
    /// ```
    pub fn program(&self) -> Option<&Path> {
        match self {
            Resolution::InUserDir(path) => Some(path),
            _ => None,
        }
    }
}

/// Returns the first package manager in [`PackageManagerKind::PRIORITY`]
/// whose executable is on `PATH`.
///
/// # Errors
///
/// Returns [`Error::NoPackageManager`] if none is found.
pub fn detect_package_manager(host: &dyn Host) -> Result<PackageManagerKind> {
    PackageManagerKind::PRIORITY
        .into_iter()
        .find(|kind| host.find_executable(kind.executable()).is_some())
        .ok_or_else(|| Error::NoPackageManager {
            looked_for: PackageManagerKind::PRIORITY
                .iter()
                .map(|k| k.executable().to_string())
                .collect(),
        })
}

/// Checks for and installs dependencies with a single package manager.
///
/// Each [`PackageSpec`] is satisfied by the first step that works:
///
/// 1. the executable in a per-user bin directory
/// 2. the executable on `PATH`
/// 3. a candidate package the manager reports as installed
/// 4. installing a candidate package, primary first
///
/// # Example
///
/// ```no_run
/// use clocmail::package::{line_counter, version_control, PackageManagerKind, PackageResolver};
/// use clocmail::platform::SystemHost;
/// use clocmail::process::SystemRunner;
///
/// let resolver = PackageResolver::new(PackageManagerKind::Apt, &SystemRunner, &SystemHost)
///     .with_install(false);
/// let resolutions = resolver.ensure_dependencies(&[line_counter("cloc"), version_control()])?;
/// println!("{:?}", resolutions);
/// # Ok::<(), clocmail::Error>(())
/// ```
pub struct PackageResolver<'a> {
    manager: Box<dyn PackageManager>,
    runner: &'a dyn CommandRunner,
    host: &'a dyn Host,
    escalate: bool,
    allow_install: bool,
    search_dirs: Vec<PathBuf>,
    smtp_port: u16,
}

impl<'a> PackageResolver<'a> {
    /// Creates a resolver for `kind` that may install packages, never
    /// escalates, searches the per-user bin directories and probes port 25.
    pub fn new(
        kind: PackageManagerKind,
        runner: &'a dyn CommandRunner,
        host: &'a dyn Host,
    ) -> Self {
        Self {
            manager: get_manager(kind),
            runner,
            host,
            escalate: false,
            allow_install: true,
            search_dirs: user_bin_dirs(),
            smtp_port: 25,
        }
    }

    /// Builds a resolver for the configured or detected package manager.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPackageManager`] if no manager is configured and
    /// none can be detected.
    pub fn from_settings(
        settings: &Settings,
        runner: &'a dyn CommandRunner,
        host: &'a dyn Host,
    ) -> Result<Self> {
        let kind = match settings.package_manager {
            Some(kind) => kind,
            None => detect_package_manager(host)?,
        };
        info!(manager = %kind, "using package manager");

        let resolver = Self::new(kind, runner, host)
            .with_search_dirs(settings.search_dirs.clone())
            .with_install(settings.install)
            .with_smtp_port(settings.smtp_port);
        let escalate = resolver.should_escalate(settings.escalation);
        Ok(resolver.with_escalation(escalate))
    }

    pub fn with_escalation(mut self, escalate: bool) -> Self {
        self.escalate = escalate;
        self
    }

    pub fn with_install(mut self, allow_install: bool) -> Self {
        self.allow_install = allow_install;
        self
    }

    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn with_smtp_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    pub fn kind(&self) -> PackageManagerKind {
        self.manager.kind()
    }

    /// Returns true if the manager reports `package` as installed.
    pub fn is_installed(&self, package: &str) -> bool {
        let spec = self.manager.query_command(package);
        match self.runner.run(&spec) {
            Ok(output) => self.manager.reports_installed(&output),
            Err(e) => {
                debug!(package, error = %e, "package query failed to run");
                false
            }
        }
    }

    /// Installs `package`. Returns false if the install command could not
    /// be run or exited non-zero.
    pub fn install(&self, package: &str) -> bool {
        if !self.allow_install {
            debug!(package, "installs disabled");
            return false;
        }

        let spec = self.privileged(self.manager.install_command(package));
        info!(package, command = %spec, "installing");
        match self.runner.run(&spec) {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!(package, status = %output.status_text(), stderr = %output.stderr_str().trim(), "install failed");
                false
            }
            Err(e) => {
                warn!(package, error = %e, "install failed to run");
                false
            }
        }
    }

    /// Makes sure every spec is satisfied, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first spec that cannot be satisfied with
    /// [`Error::MissingDependency`] or [`Error::NoMailTransport`].
    pub fn ensure_dependencies(&self, specs: &[PackageSpec]) -> Result<Vec<Resolution>> {
        let mut resolutions = Vec::with_capacity(specs.len());
        for spec in specs {
            let resolution = match spec.requirement {
                Requirement::Executable => self.ensure_executable(spec)?,
                Requirement::MailTransport => self.ensure_mail_transport(spec)?,
            };
            info!(dependency = %spec.name, ?resolution, "dependency satisfied");
            resolutions.push(resolution);
        }
        Ok(resolutions)
    }

    fn ensure_executable(&self, spec: &PackageSpec) -> Result<Resolution> {
        if let Some(binary) = &spec.binary {
            if let Some(resolution) = self.locate(binary) {
                return Ok(resolution);
            }
        }

        let packages = spec.packages(self.kind());
        for package in packages {
            if self.is_installed(package) {
                return Ok(Resolution::AlreadyInstalled(package.clone()));
            }
            if self.install(package) {
                return Ok(Resolution::Installed(package.clone()));
            }
        }

        let tried = if packages.is_empty() {
            spec.binary.iter().cloned().collect()
        } else {
            packages.to_vec()
        };
        Err(Error::MissingDependency {
            name: spec.name.clone(),
            tried,
        })
    }

    fn ensure_mail_transport(&self, spec: &PackageSpec) -> Result<Resolution> {
        let packages = spec.packages(self.kind());

        if let Some(package) = packages.iter().find(|p| self.is_installed(p)) {
            return Ok(Resolution::AlreadyInstalled(package.clone()));
        }
        if let Some(package) = packages.iter().find(|p| self.install(p)) {
            return Ok(Resolution::Installed(package.clone()));
        }
        if self.host.is_port_listening(self.smtp_port) {
            return Ok(Resolution::Listening(self.smtp_port));
        }

        Err(Error::NoMailTransport {
            tried: packages.to_vec(),
            port: self.smtp_port,
        })
    }

    /// Per-user bin directories first, then `PATH`.
    fn locate(&self, binary: &str) -> Option<Resolution> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(binary))
            .find(|path| path.is_file())
            .map(Resolution::InUserDir)
            .or_else(|| self.host.find_executable(binary).map(Resolution::Found))
    }

    fn should_escalate(&self, escalation: Escalation) -> bool {
        match escalation {
            Escalation::Never => false,
            Escalation::Always => true,
            Escalation::Auto => {
                self.manager.needs_privileges()
                    && self.host.find_executable("sudo").is_some()
                    && !self.is_root()
            }
        }
    }

    fn is_root(&self) -> bool {
        self.runner
            .run(&CommandSpec::new("id").arg("-u"))
            .map(|output| output.success() && output.stdout_str().trim() == "0")
            .unwrap_or(false)
    }

    /// Wraps an install in `sudo`, passing its environment as `KEY=value`
    /// arguments since sudo resets the environment.
    fn privileged(&self, spec: CommandSpec) -> CommandSpec {
        if !self.escalate || !self.manager.needs_privileges() {
            return spec;
        }
        CommandSpec::new("sudo")
            .args(spec.env.iter().map(|(k, v)| format!("{}={}", k, v)))
            .arg(spec.program)
            .args(spec.args)
            .input(spec.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{line_counter, mail_client, mail_transport, version_control};
    use crate::testing::FakeSystem;

    fn resolver<'a>(kind: PackageManagerKind, sys: &'a FakeSystem) -> PackageResolver<'a> {
        PackageResolver::new(kind, sys, sys).with_search_dirs(Vec::new())
    }

    #[test]
    fn test_detect_first_in_priority_order() {
        let sys = FakeSystem::new()
            .with_executable("brew")
            .with_executable("pacman")
            .with_executable("dnf");
        assert_eq!(detect_package_manager(&sys).unwrap(), PackageManagerKind::Dnf);
    }

    #[test]
    fn test_detect_none_is_fatal() {
        let sys = FakeSystem::new();
        let err = detect_package_manager(&sys).unwrap_err();
        assert!(matches!(err, Error::NoPackageManager { ref looked_for } if looked_for.len() == 5));
        assert!(sys.calls().is_empty());
    }

    #[test]
    fn test_found_on_path_skips_package_manager() {
        let sys = FakeSystem::new().with_executable("cloc");
        let resolutions = resolver(PackageManagerKind::Apt, &sys)
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Found(PathBuf::from("/usr/bin/cloc"))]);
        assert!(sys.calls().is_empty());
    }

    #[test]
    fn test_found_in_user_bin_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cloc = dir.path().join("cloc");
        std::fs::write(&cloc, "#!/bin/sh\n").unwrap();

        let sys = FakeSystem::new();
        let resolutions = PackageResolver::new(PackageManagerKind::Pacman, &sys, &sys)
            .with_search_dirs(vec![dir.path().to_path_buf()])
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::InUserDir(cloc.clone())]);
        assert_eq!(resolutions[0].program(), Some(cloc.as_path()));
    }

    #[test]
    fn test_already_installed_by_query() {
        let sys = FakeSystem::new().respond("dpkg-query -W -f=${Status} git", 0, "install ok installed");
        let resolutions = resolver(PackageManagerKind::Apt, &sys)
            .ensure_dependencies(&[version_control()])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::AlreadyInstalled("git".into())]);
        assert!(!sys.called("apt-get install"));
    }

    #[test]
    fn test_installs_when_missing() {
        let sys = FakeSystem::new().respond("rpm -q", 1, "");
        let resolutions = resolver(PackageManagerKind::Dnf, &sys)
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Installed("cloc".into())]);
        assert!(sys.called("dnf install -y cloc"));
    }

    #[test]
    fn test_retries_with_alternate_package() {
        let sys = FakeSystem::new()
            .respond("dpkg-query", 1, "")
            .respond("install -y --no-install-recommends mailutils", 100, "");
        let resolutions = resolver(PackageManagerKind::Apt, &sys)
            .ensure_dependencies(&[mail_client("mail")])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Installed("bsd-mailx".into())]);
        assert_eq!(sys.call_count("dpkg-query"), 2);
    }

    #[test]
    fn test_unresolved_dependency_is_fatal() {
        let sys = FakeSystem::new()
            .respond("pacman -Qi", 1, "")
            .respond("pacman -S", 1, "");
        let err = resolver(PackageManagerKind::Pacman, &sys)
            .ensure_dependencies(&[line_counter("cloc"), version_control()])
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency { ref name, .. } if name == "line-counter"));
        // stops at the first failure
        assert!(!sys.called("git"));
    }

    #[test]
    fn test_no_install_only_checks() {
        let sys = FakeSystem::new().respond("rpm -q", 1, "");
        let err = resolver(PackageManagerKind::Yum, &sys)
            .with_install(false)
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
        assert!(!sys.called("yum install"));
    }

    #[test]
    fn test_mail_transport_checks_all_before_installing() {
        let sys = FakeSystem::new()
            .respond("dpkg-query -W -f=${Status} exim4", 0, "install ok installed")
            .respond("dpkg-query", 1, "");
        let resolutions = resolver(PackageManagerKind::Apt, &sys)
            .ensure_dependencies(&[mail_transport()])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::AlreadyInstalled("exim4".into())]);
        assert!(!sys.called("apt-get install"));
    }

    #[test]
    fn test_removed_package_with_leftover_config_is_reinstalled() {
        let sys = FakeSystem::new()
            .respond("dpkg-query -W -f=${Status} postfix", 0, "deinstall ok config-files")
            .respond("dpkg-query", 1, "");
        let resolutions = resolver(PackageManagerKind::Apt, &sys)
            .ensure_dependencies(&[mail_transport()])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Installed("postfix".into())]);
        assert!(sys.called("apt-get install -y --no-install-recommends postfix"));
    }

    #[test]
    fn test_mail_transport_installs_in_turn() {
        let sys = FakeSystem::new()
            .respond("rpm -q", 1, "")
            .respond("dnf install -y postfix", 1, "");
        let resolutions = resolver(PackageManagerKind::Dnf, &sys)
            .ensure_dependencies(&[mail_transport()])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Installed("sendmail".into())]);
    }

    #[test]
    fn test_mail_transport_falls_back_to_listening_port() {
        let sys = FakeSystem::new().listening_on(25);
        let resolutions = resolver(PackageManagerKind::Homebrew, &sys)
            .ensure_dependencies(&[mail_transport()])
            .unwrap();
        assert_eq!(resolutions, vec![Resolution::Listening(25)]);
    }

    #[test]
    fn test_no_mail_transport_is_fatal() {
        let sys = FakeSystem::new().listening_on(587);
        let err = resolver(PackageManagerKind::Homebrew, &sys)
            .ensure_dependencies(&[mail_transport()])
            .unwrap_err();
        assert!(matches!(err, Error::NoMailTransport { port: 25, .. }));
    }

    #[test]
    fn test_escalated_install_passes_env_through_sudo() {
        let sys = FakeSystem::new().respond("dpkg-query", 1, "");
        resolver(PackageManagerKind::Apt, &sys)
            .with_escalation(true)
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap();
        assert!(sys.called(
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y --no-install-recommends cloc"
        ));
    }

    #[test]
    fn test_homebrew_never_escalates() {
        let sys = FakeSystem::new().respond("brew list", 1, "");
        resolver(PackageManagerKind::Homebrew, &sys)
            .with_escalation(true)
            .ensure_dependencies(&[line_counter("cloc")])
            .unwrap();
        assert!(!sys.called("sudo"));
        assert!(sys.called("brew install cloc"));
    }

    #[test]
    fn test_auto_escalation_skipped_for_root() {
        let sys = FakeSystem::new()
            .with_executable("sudo")
            .respond("id -u", 0, "0\n");
        let resolver = resolver(PackageManagerKind::Apt, &sys);
        assert!(!resolver.should_escalate(Escalation::Auto));

        let sys = FakeSystem::new()
            .with_executable("sudo")
            .respond("id -u", 0, "1000\n");
        let resolver = PackageResolver::new(PackageManagerKind::Apt, &sys, &sys);
        assert!(resolver.should_escalate(Escalation::Auto));
        assert!(!resolver.should_escalate(Escalation::Never));
    }
}
