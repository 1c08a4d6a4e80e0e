use super::{Acquired, Target};
use crate::error::SourceError;
use crate::process::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Derives the local directory name for a repository URL.
///
/// Scheme, host and owner are dropped along with a trailing `.git`, so
/// `https://example.com/org/repo.git`, `https://example.com/org/repo` and
/// `git@example.com:org/repo.git` all map to `repo`. No network access.
pub fn derive_directory_name(url: &str) -> String {
    let trimmed = normalize(url);
    let name = trimmed
        .rsplit(|c: char| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Where a repository is cloned to: `<base>/<name>`, or `<name>` relative
/// to the working directory without a base.
pub fn clone_path(base: Option<&Path>, url: &str) -> PathBuf {
    let name = derive_directory_name(url);
    match base {
        Some(base) => base.join(name),
        None => PathBuf::from(name),
    }
}

/// Compares repository URLs, ignoring a trailing slash or `.git`.
pub fn urls_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix(".git")
        .unwrap_or(url)
        .trim_end_matches('/')
}

pub(super) fn acquire(
    runner: &dyn CommandRunner,
    git: &str,
    url: &str,
    dir: &Path,
    depth: Option<u32>,
) -> Result<Acquired, SourceError> {
    if dir.exists() {
        return match recorded_remote(runner, git, dir) {
            Some(remote) if urls_match(&remote, url) => {
                info!(url, dir = %dir.display(), "reusing existing clone");
                Ok(Acquired::path(dir.to_path_buf()))
            }
            remote => {
                debug!(url, ?remote, dir = %dir.display(), "existing directory has another remote");
                Err(SourceError::DirectoryMismatch {
                    existing_path: dir.to_path_buf(),
                    requested_url: url.to_string(),
                })
            }
        };
    }

    let mut cmd = CommandSpec::new(git).arg("clone");
    if let Some(depth) = depth {
        cmd = cmd.arg("--depth").arg(depth.to_string());
    }
    let cmd = cmd.arg(url).path_arg(dir);

    info!(url, dir = %dir.display(), "cloning");
    let output = runner.run(&cmd).map_err(|e| SourceError::Spawn {
        program: git.to_string(),
        message: e.to_string(),
    })?;

    if !output.success() {
        let stderr = output.stderr_str();
        let message = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| output.status_text());
        return Err(SourceError::CloneFailed {
            url: url.to_string(),
            message,
        });
    }

    Ok(Acquired {
        target: Target::Path(dir.to_path_buf()),
        transcript: output.combined(),
    })
}

/// `remote.origin.url` of an existing checkout, if any.
fn recorded_remote(runner: &dyn CommandRunner, git: &str, dir: &Path) -> Option<String> {
    let cmd = CommandSpec::new(git)
        .arg("-C")
        .path_arg(dir)
        .args(["config", "--get", "remote.origin.url"]);
    let output = runner.run(&cmd).ok()?;
    let remote = output.stdout_str().trim().to_string();
    (output.success() && !remote.is_empty()).then_some(remote)
}
