//! Synchronous subprocess execution.
//!
//! Every external tool (package managers, git, the counting tool and the
//! mail client) is invoked through the [`CommandRunner`] trait. A call takes
//! a [`CommandSpec`] and blocks until the child exits, returning its exit
//! code and captured output as a [`CommandOutput`].

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Where a child process reads its standard input from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Input {
    /// `/dev/null`.
    #[default]
    Null,
    /// The stdin of this process, passed through untouched.
    Inherit,
    /// The given bytes, written to a pipe.
    Bytes(Vec<u8>),
}

/// A command line to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub input: Input,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn input(mut self, input: Input) -> Self {
        self.input = input;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout followed by stderr, the way a terminal would show both.
    pub fn combined(&self) -> String {
        let mut text = self.stdout_str();
        let stderr = self.stderr_str();
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        text
    }

    /// Human-readable exit status, e.g. `exit code 128`.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs commands to completion.
pub trait CommandRunner {
    /// Runs the command and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be spawned or waited
    /// on. A non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        debug!(command = %spec, "running");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(match spec.input {
                Input::Null => Stdio::null(),
                Input::Inherit => Stdio::inherit(),
                Input::Bytes(_) => Stdio::piped(),
            });
        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take();

        // Feed stdin from another thread so a child that writes while it
        // reads can't fill both pipes and block.
        let output = std::thread::scope(|scope| {
            let writer = match (&spec.input, stdin) {
                (Input::Bytes(bytes), Some(mut stdin)) => Some(scope.spawn(move || {
                    match stdin.write_all(bytes) {
                        // The child exited without reading everything
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                        result => result,
                    }
                })),
                _ => None,
            };

            let output = child.wait_with_output()?;
            if let Some(writer) = writer {
                writer
                    .join()
                    .map_err(|_| io::Error::other("stdin writer panicked"))??;
            }
            Ok::<_, io::Error>(output)
        })?;
        debug!(command = %spec.program, code = ?output.status.code(), "finished");

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
