use crate::config::Settings;
use crate::process::{CommandSpec, Input};
use std::path::Path;

/// Builds invocations of the external counting tool.
///
/// Pass-through options are forwarded as given, ahead of the target.
///
/// # Example
///
/// ```
/// use clocmail::source::Counter;
/// use std::path::Path;
///
/// let counter = Counter::new("cloc").with_options(vec!["--quiet".into()]);
/// let cmd = counter.command_for_path(Path::new("repo"));
/// assert_eq!(cmd.to_string(), "cloc --quiet repo");
///
/// let cmd = counter.with_stdin_name("main.rs").command_for_stdin();
/// assert_eq!(cmd.to_string(), "cloc --quiet --stdin-name=main.rs -");
/// ```
#[derive(Debug, Clone)]
pub struct Counter {
    program: String,
    options: Vec<String>,
    stdin_name: String,
}

impl Counter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            options: Vec::new(),
            stdin_name: "stdin.txt".to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.counter)
            .with_options(settings.cloc_options.clone())
            .with_stdin_name(&settings.stdin_name)
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_stdin_name(mut self, name: impl Into<String>) -> Self {
        self.stdin_name = name.into();
        self
    }

    pub fn command_for_path(&self, path: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(&self.options)
            .path_arg(path)
    }

    /// Reads source from this process's stdin.
    pub fn command_for_stdin(&self) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(&self.options)
            .arg(format!("--stdin-name={}", self.stdin_name))
            .arg("-")
            .input(Input::Inherit)
    }
}
