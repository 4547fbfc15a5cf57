//! Job runner - executes one matrix job's steps strictly in order
//!
//! The first failing step halts the job; remaining steps are recorded as
//! skipped and never reach the shell. A provisioning failure halts the job
//! before any step runs.

use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::core::{config::ProvisionConfig, Job, RunStatus, StepFailure, StepState};
use crate::execution::{
    engine::{EventHandler, ExecutionEvent},
    provision::{JobEnv, ProvisionError, Provisioner},
    report::{JobReport, StepReport},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Executes a single matrix job
pub struct JobRunner<R> {
    runner: Arc<R>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: CommandRunner> JobRunner<R> {
    pub fn new(runner: Arc<R>, event_handlers: Arc<Mutex<Vec<EventHandler>>>) -> Self {
        Self {
            runner,
            event_handlers,
        }
    }

    async fn emit(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Run the job to completion and return its report
    pub async fn run(&self, mut job: Job, provision: Option<ProvisionConfig>) -> JobReport {
        let value = job.value.clone();

        job.state.start();
        info!("Starting job for matrix value {}", value);
        self.emit(ExecutionEvent::JobStarted {
            value: value.clone(),
        })
        .await;

        let job_env = match &provision {
            Some(config) => {
                let provisioner = Provisioner::new(self.runner.as_ref());
                match provisioner.provision(config, &job.variables).await {
                    Ok(env) => env,
                    Err(error) => return self.provision_failed(job, error).await,
                }
            }
            None => JobEnv::inherited(),
        };

        let mut base_env = job.env.clone();
        base_env.extend(job_env.env.clone());

        let mut steps = Vec::with_capacity(job.steps.len());
        let mut halted = false;

        for step in &job.steps {
            let command = step.render_command(&job.variables);

            if halted {
                let reason = "earlier step failed".to_string();
                self.emit(ExecutionEvent::StepSkipped {
                    value: value.clone(),
                    step_id: step.id.clone(),
                    reason: reason.clone(),
                })
                .await;
                steps.push(StepReport {
                    id: step.id.clone(),
                    name: step.name.clone(),
                    command,
                    state: StepState::Skipped { reason },
                    stdout: String::new(),
                    stderr: String::new(),
                });
                continue;
            }

            let started_at = Utc::now();
            self.emit(ExecutionEvent::StepStarted {
                value: value.clone(),
                step_id: step.id.clone(),
            })
            .await;

            let mut env = base_env.clone();
            env.extend(step.render_env(&job.variables));

            let invocation = Invocation::new(command.clone())
                .with_env(env)
                .with_timeout(step.timeout_secs);

            let (state, stdout, stderr) = match self.runner.run(&invocation).await {
                Ok(output) if output.success() => {
                    self.emit(ExecutionEvent::StepCompleted {
                        value: value.clone(),
                        step_id: step.id.clone(),
                    })
                    .await;
                    (
                        StepState::Completed {
                            exit_code: 0,
                            started_at,
                            completed_at: Utc::now(),
                        },
                        output.stdout,
                        output.stderr,
                    )
                }
                Ok(output) => {
                    let failure = StepFailure {
                        message: describe_exit(&output),
                        exit_code: output.exit_code,
                    };
                    warn!("[{}] step {} failed: {}", value, step.id, failure.message);
                    self.emit(ExecutionEvent::StepFailed {
                        value: value.clone(),
                        step_id: step.id.clone(),
                        failure: failure.message.clone(),
                    })
                    .await;
                    halted = true;
                    (
                        StepState::Failed {
                            failure,
                            started_at,
                            failed_at: Utc::now(),
                        },
                        output.stdout,
                        output.stderr,
                    )
                }
                Err(error) => {
                    let failure = StepFailure {
                        message: error.to_string(),
                        exit_code: None,
                    };
                    warn!("[{}] step {} failed: {}", value, step.id, failure.message);
                    self.emit(ExecutionEvent::StepFailed {
                        value: value.clone(),
                        step_id: step.id.clone(),
                        failure: failure.message.clone(),
                    })
                    .await;
                    halted = true;
                    (
                        StepState::Failed {
                            failure,
                            started_at,
                            failed_at: Utc::now(),
                        },
                        String::new(),
                        String::new(),
                    )
                }
            };

            steps.push(StepReport {
                id: step.id.clone(),
                name: step.name.clone(),
                command,
                state,
                stdout,
                stderr,
            });
        }

        let status = if halted {
            job.state.fail();
            RunStatus::Failed
        } else {
            job.state.complete();
            RunStatus::Completed
        };

        self.emit(ExecutionEvent::JobCompleted {
            value: value.clone(),
            status,
        })
        .await;

        JobReport {
            value,
            status,
            provision_error: None,
            started_at: job.state.started_at,
            completed_at: job.state.completed_at,
            steps,
        }
    }

    /// Fail the job before any step runs
    async fn provision_failed(&self, mut job: Job, error: ProvisionError) -> JobReport {
        let value = job.value.clone();
        warn!("[{}] provisioning failed: {}", value, error);

        let reason = "environment provisioning failed".to_string();
        let mut steps = Vec::with_capacity(job.steps.len());
        for step in &job.steps {
            self.emit(ExecutionEvent::StepSkipped {
                value: value.clone(),
                step_id: step.id.clone(),
                reason: reason.clone(),
            })
            .await;
            steps.push(StepReport {
                id: step.id.clone(),
                name: step.name.clone(),
                command: step.render_command(&job.variables),
                state: StepState::Skipped {
                    reason: reason.clone(),
                },
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        job.state.fail();
        self.emit(ExecutionEvent::JobCompleted {
            value: value.clone(),
            status: RunStatus::Failed,
        })
        .await;

        JobReport {
            value,
            status: RunStatus::Failed,
            provision_error: Some(error.to_string()),
            started_at: job.state.started_at,
            completed_at: job.state.completed_at,
            steps,
        }
    }
}

fn describe_exit(output: &CommandOutput) -> String {
    let base = match output.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };

    let tail = output.stderr_tail(5);
    if tail.is_empty() {
        base
    } else {
        format!("{}: {}", base, tail)
    }
}
