//! Scripted [`CommandRunner`] and [`Host`] for unit tests.

use crate::platform::Host;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;

enum Response {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    SpawnError,
}

struct Rule {
    pattern: String,
    response: Response,
}

/// Records every command it is asked to run and answers from a list of
/// rules. The first rule whose pattern is a substring of the rendered
/// command wins; unmatched commands succeed with empty output.
///
/// `git clone ... <dir>` creates `<dir>` so later steps see the clone.
#[derive(Default)]
pub struct FakeSystem {
    rules: Vec<Rule>,
    executables: Vec<String>,
    stdin_terminal: bool,
    listening: Vec<u16>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, name: &str) -> Self {
        self.executables.push(name.to_string());
        self
    }

    pub fn respond(mut self, pattern: &str, code: i32, stdout: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            response: Response::Exit {
                code,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        });
        self
    }

    pub fn respond_stderr(mut self, pattern: &str, code: i32, stderr: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            response: Response::Exit {
                code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        });
        self
    }

    pub fn fail_spawn(mut self, pattern: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            response: Response::SpawnError,
        });
        self
    }

    pub fn listening_on(mut self, port: u16) -> Self {
        self.listening.push(port);
        self
    }

    pub fn with_terminal_stdin(mut self) -> Self {
        self.stdin_terminal = true;
        self
    }

    /// Every command run so far, rendered.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.to_string()).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    pub fn called(&self, pattern: &str) -> bool {
        self.call_count(pattern) > 0
    }
}

impl CommandRunner for FakeSystem {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let rendered = spec.to_string();

        let rule = self.rules.iter().find(|r| rendered.contains(&r.pattern));
        let output = match rule.map(|r| &r.response) {
            Some(Response::SpawnError) => {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
            }
            Some(Response::Exit {
                code,
                stdout,
                stderr,
            }) => CommandOutput {
                code: Some(*code),
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            },
            None => CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            },
        };

        if std::path::Path::new(&spec.program).ends_with("git") && spec.args.first().map(String::as_str) == Some("clone") && output.success() {
            if let Some(dir) = spec.args.last() {
                std::fs::create_dir_all(dir)?;
            }
        }

        Ok(output)
    }
}

impl Host for FakeSystem {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables
            .iter()
            .any(|e| e == name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    fn stdin_is_terminal(&self) -> bool {
        self.stdin_terminal
    }

    fn is_port_listening(&self, port: u16) -> bool {
        self.listening.contains(&port)
    }
}
