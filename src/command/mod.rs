//! Shell command execution seam
//!
//! Every external process the runner starts goes through the
//! [`CommandRunner`] trait, so tests can script outcomes without touching
//! the system shell.

pub mod output;
pub mod shell;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

pub use output::{CommandError, CommandOutput};
pub use shell::ShellRunner;

/// One command to execute: a shell line plus its environment
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Shell command line (run through `sh -c`)
    pub command: String,

    /// Environment overrides applied on top of the inherited environment
    pub env: HashMap<String, String>,

    /// Working directory (inherited when None)
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds; no timeout when None
    pub timeout_secs: Option<u64>,
}

impl Invocation {
    /// Create an invocation with inherited environment and no timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: HashMap::new(),
            cwd: None,
            timeout_secs: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute one invocation and capture its outcome
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}
