//! Per-job environment provisioning
//!
//! "Provisioning" here is what the workflow's version pinning amounts to on
//! a single machine: resolve the interpreter for the job's matrix value,
//! verify it answers `--version`, and optionally create a virtualenv whose
//! bin directory shadows PATH for every subsequent step. All commands go
//! through the [`CommandRunner`] seam so tests can script them.

use crate::command::{CommandRunner, Invocation};
use crate::core::config::ProvisionConfig;
use crate::core::step::render_template;
use std::collections::HashMap;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

/// Error provisioning a job environment
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("interpreter `{interpreter}` is not available: {reason}")]
    InterpreterUnavailable { interpreter: String, reason: String },

    #[error("failed to create virtualenv with `{interpreter}`: {reason}")]
    VenvFailed { interpreter: String, reason: String },

    #[error("failed to create scratch directory: {0}")]
    Scratch(String),
}

/// A provisioned environment for one job
pub struct JobEnv {
    /// Environment overrides applied to every step of the job
    pub env: HashMap<String, String>,

    /// Scratch directory backing the virtualenv; removed on drop
    _scratch: Option<TempDir>,
}

impl JobEnv {
    /// An environment with no overrides (steps inherit the parent env)
    pub fn inherited() -> Self {
        Self {
            env: HashMap::new(),
            _scratch: None,
        }
    }
}

/// Provisions interpreter environments through the command seam
pub struct Provisioner<'a, R: ?Sized> {
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Provisioner<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Provision an environment for one job.
    ///
    /// The interpreter template is rendered with the job's variables
    /// (including `matrix.<axis>`), so `python{{ matrix.python }}` becomes
    /// `python3.6` for the "3.6" job.
    pub async fn provision(
        &self,
        config: &ProvisionConfig,
        variables: &HashMap<String, String>,
    ) -> Result<JobEnv, ProvisionError> {
        let interpreter = render_template(&config.interpreter, variables);
        debug!("Provisioning with interpreter: {}", interpreter);

        let check = Invocation::new(format!("{} --version", interpreter));
        match self.runner.run(&check).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                return Err(ProvisionError::InterpreterUnavailable {
                    interpreter,
                    reason: match output.exit_code {
                        Some(code) => format!("exit code {}", code),
                        None => "terminated by signal".to_string(),
                    },
                });
            }
            Err(error) => {
                return Err(ProvisionError::InterpreterUnavailable {
                    interpreter,
                    reason: error.to_string(),
                });
            }
        }

        if !config.venv {
            return Ok(JobEnv::inherited());
        }

        let scratch = TempDir::new().map_err(|e| ProvisionError::Scratch(e.to_string()))?;
        let venv_dir = scratch.path().join("venv");

        let create = Invocation::new(format!("{} -m venv {}", interpreter, venv_dir.display()));
        match self.runner.run(&create).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                return Err(ProvisionError::VenvFailed {
                    interpreter,
                    reason: match output.exit_code {
                        Some(code) => format!("exit code {}: {}", code, output.stderr_tail(3)),
                        None => "terminated by signal".to_string(),
                    },
                });
            }
            Err(error) => {
                return Err(ProvisionError::VenvFailed {
                    interpreter,
                    reason: error.to_string(),
                });
            }
        }

        let bin_dir = venv_dir.join("bin");
        let path = match std::env::var("PATH") {
            Ok(parent) => format!("{}:{}", bin_dir.display(), parent),
            Err(_) => bin_dir.display().to_string(),
        };

        let mut env = HashMap::new();
        env.insert("PATH".to_string(), path);
        env.insert(
            "VIRTUAL_ENV".to_string(),
            venv_dir.display().to_string(),
        );

        info!("Provisioned virtualenv at {}", venv_dir.display());

        Ok(JobEnv {
            env,
            _scratch: Some(scratch),
        })
    }
}
