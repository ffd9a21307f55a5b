//! Command runner port for local `git` invocations.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::CommandError;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a version-control command in a working directory and waits for it.
///
/// A non-zero exit is *not* an error at this level; `Err` means the process
/// could not be run at all.
pub trait CommandRunner: Send + Sync {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, CommandError>;
}

/// Spawns the real `git` binary.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    program: String,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self {
            program: "git".into(),
        }
    }

    /// Use a different executable, e.g. an absolute path to `git`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(cmd = %command, dir = %dir.display(), "running command");

        let output = Command::new(&self.program)
            .current_dir(dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| CommandError::Spawn { command, source })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
