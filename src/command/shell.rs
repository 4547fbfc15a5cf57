//! Shell runner - executes invocations through `sh -c`

use crate::command::{CommandError, CommandOutput, CommandRunner, Invocation};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Production command runner backed by the system shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    /// Shell executable used to interpret command lines
    shell: String,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// Use a specific shell executable instead of `sh`
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        debug!("Running command: {}", invocation.command);

        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(&invocation.command)
            .kill_on_drop(true);

        for (key, value) in &invocation.env {
            command.env(key, value);
        }
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let result = match invocation.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| CommandError::Timeout(secs))?,
            None => command.output().await,
        };

        let output = result.map_err(|e| CommandError::Spawn(e.to_string()))?;

        let exit_code = output.status.code();
        if !output.status.success() {
            warn!(
                "Command exited with code {:?}: {}",
                exit_code, invocation.command
            );
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
