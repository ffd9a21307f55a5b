//! Scripted [`CommandRunner`] for deterministic tests.
//!
//! Responses are matched by prefix against the space-joined argument list,
//! first rule wins. Every call is recorded so tests can assert on what ran.
//!
//! ```
//! use gitconflict_core::git::mock::ScriptedRunner;
//! use gitconflict_core::git::{CommandOutput, CommandRunner};
//!
//! let runner = ScriptedRunner::new().on("merge-base", CommandOutput::ok("abc123\n"));
//! let out = runner
//!     .run(std::path::Path::new("."), &["merge-base", "origin/main", "topic"])
//!     .unwrap();
//! assert_eq!(out.stdout, "abc123\n");
//! assert_eq!(runner.calls().len(), 1);
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::runner::{CommandOutput, CommandRunner};
use crate::errors::CommandError;

/// Replays canned outputs for matching commands.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    rules: Vec<(String, Reply)>,
    calls: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    SpawnError(String),
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`.
    pub fn on(self, prefix: &str, output: CommandOutput) -> Self {
        self.push_rule(prefix, Reply::Output(output));
        self
    }

    /// Make commands starting with `prefix` fail to spawn.
    pub fn fail_spawn(self, prefix: &str, message: &str) -> Self {
        self.push_rule(prefix, Reply::SpawnError(message.to_string()));
        self
    }

    /// Arguments of every call so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    fn push_rule(&self, prefix: &str, reply: Reply) {
        self.lock().rules.push((prefix.to_string(), reply));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _dir: &Path, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let joined = args.join(" ");
        let mut inner = self.lock();
        inner.calls.push(args.iter().map(|a| a.to_string()).collect());

        let reply = inner
            .rules
            .iter()
            .find(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::SpawnError(message)) => Err(CommandError::Spawn {
                command: format!("git {}", joined),
                source: std::io::Error::new(std::io::ErrorKind::Other, message),
            }),
            None => Ok(CommandOutput::failed(
                1,
                format!("unexpected command: git {}", joined),
            )),
        }
    }
}
