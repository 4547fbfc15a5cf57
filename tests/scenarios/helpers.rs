//! Test utilities shared by the scenario suite

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use whisker::command::{CommandError, CommandOutput, CommandRunner, Invocation};
use whisker::core::config::WorkflowConfig;
use whisker::core::{RunStatus, StepState};
use whisker::execution::{JobReport, RunEngine, RunReport};

/// The canonical six-step workflow across two interpreter versions
pub const MATRIX_WORKFLOW: &str = r#"
name: "Package CI"
on: push

matrix:
  python: ["3.6", "3.7"]

variables:
  package: "acme"

steps:
  - id: "install"
    name: "Install package"
    run: "pip install ."

  - id: "smoke"
    name: "Version check"
    run: "{{ package }} --version"

  - id: "tools"
    name: "Install lint and test tooling"
    run: "pip install flake8 pytest"

  - id: "lint"
    name: "Style check"
    run: "flake8 --max-line-length 88 --ignore E203,E501"

  - id: "package-check"
    name: "Packaging self-check"
    run: "python setup.py check -m -s"

  - id: "test"
    name: "Test suite"
    run: "pytest"
"#;

/// Same workflow with interpreter provisioning enabled
pub const PROVISIONED_WORKFLOW: &str = r#"
name: "Package CI"
on: push

matrix:
  python: ["3.6", "3.7"]

variables:
  package: "acme"

provision:
  interpreter: "python{{ matrix.python }}"
  venv: true

steps:
  - id: "install"
    name: "Install package"
    run: "pip install ."

  - id: "smoke"
    name: "Version check"
    run: "{{ package }} --version"

  - id: "test"
    name: "Test suite"
    run: "pytest"
"#;

/// Scripted outcome for commands matched by one rule
pub struct Rule {
    /// Restrict the rule to one matrix value (any value when None)
    pub value: Option<String>,

    /// Substring the rendered command must contain
    pub command_contains: String,

    /// Exit code the scripted command returns
    pub exit_code: i32,
}

impl Rule {
    /// Fail a command for every matrix value
    pub fn fail(command_contains: &str, exit_code: i32) -> Self {
        Self {
            value: None,
            command_contains: command_contains.to_string(),
            exit_code,
        }
    }

    /// Fail a command only for one matrix value
    pub fn fail_for(value: &str, command_contains: &str, exit_code: i32) -> Self {
        Self {
            value: Some(value.to_string()),
            command_contains: command_contains.to_string(),
            exit_code,
        }
    }
}

/// One invocation as the scripted runner saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Matrix value taken from the `MATRIX_*` env var (absent for
    /// provisioning commands, which run before the job env is assembled)
    pub value: Option<String>,
    pub command: String,
    pub env: HashMap<String, String>,
}

/// Command runner scripted per (matrix value, command substring).
///
/// Every command not matched by a rule succeeds silently.
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    invocations: Mutex<Vec<Recorded>>,
}

impl ScriptedRunner {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn all_success() -> Arc<Self> {
        Arc::new(Self::new(Vec::new()))
    }

    pub fn with_rules(rules: Vec<Rule>) -> Arc<Self> {
        Arc::new(Self::new(rules))
    }

    fn matrix_value(invocation: &Invocation) -> Option<String> {
        invocation
            .env
            .iter()
            .find(|(key, _)| key.starts_with("MATRIX_"))
            .map(|(_, value)| value.clone())
    }

    /// Everything this runner executed, in global order
    pub fn recorded(&self) -> Vec<Recorded> {
        self.invocations.lock().unwrap().clone()
    }

    /// Step commands executed for one matrix value, in order
    pub fn commands_for(&self, value: &str) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|r| r.value.as_deref() == Some(value))
            .map(|r| r.command)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let value = Self::matrix_value(invocation);
        self.invocations.lock().unwrap().push(Recorded {
            value: value.clone(),
            command: invocation.command.clone(),
            env: invocation.env.clone(),
        });

        for rule in &self.rules {
            let value_matches = match &rule.value {
                Some(v) => value.as_deref() == Some(v.as_str()),
                None => true,
            };
            if value_matches && invocation.command.contains(&rule.command_contains) {
                let mut output = CommandOutput::with_exit_code(rule.exit_code);
                if rule.exit_code != 0 {
                    output.stderr = "scripted failure".to_string();
                }
                return Ok(output);
            }
        }

        Ok(CommandOutput::ok())
    }
}

/// Parse the workflow and run its whole matrix with the given runner
pub async fn run_matrix(yaml: &str, runner: Arc<ScriptedRunner>) -> RunReport {
    let config = WorkflowConfig::from_yaml(yaml).expect("workflow should parse");
    let workflow = config.to_workflow();
    let engine = RunEngine::new(runner);
    engine.execute(&workflow).await
}

pub fn assert_run_completed(report: &RunReport) {
    assert_eq!(
        report.status,
        RunStatus::Completed,
        "run should have completed, jobs: {:?}",
        report
            .jobs
            .iter()
            .map(|j| (j.value.clone(), j.status))
            .collect::<Vec<_>>()
    );
}

pub fn assert_run_failed(report: &RunReport) {
    assert_eq!(report.status, RunStatus::Failed, "run should have failed");
}

/// Look up a job report by matrix value
pub fn job<'a>(report: &'a RunReport, value: &str) -> &'a JobReport {
    report
        .job(value)
        .unwrap_or_else(|| panic!("no job for matrix value {}", value))
}

fn step<'a>(report: &'a RunReport, value: &str, step_id: &str) -> &'a whisker::StepReport {
    job(report, value)
        .steps
        .iter()
        .find(|s| s.id == step_id)
        .unwrap_or_else(|| panic!("no step {} in job {}", step_id, value))
}

pub fn assert_job_succeeded(report: &RunReport, value: &str) {
    assert_eq!(
        job(report, value).status,
        RunStatus::Completed,
        "job {} should have succeeded",
        value
    );
}

pub fn assert_job_failed_at(report: &RunReport, value: &str, step_id: &str) {
    let job = job(report, value);
    assert_eq!(job.status, RunStatus::Failed, "job {} should have failed", value);
    assert_eq!(
        job.failed_step().map(|s| s.id.as_str()),
        Some(step_id),
        "job {} should have failed at step {}",
        value,
        step_id
    );
}

pub fn assert_step_completed(report: &RunReport, value: &str, step_id: &str) {
    assert!(
        step(report, value, step_id).completed(),
        "step {} of job {} should have completed",
        step_id,
        value
    );
}

pub fn assert_step_skipped(report: &RunReport, value: &str, step_id: &str) {
    assert!(
        step(report, value, step_id).skipped(),
        "step {} of job {} should have been skipped",
        step_id,
        value
    );
}

/// Exit code carried by a failed step's report
pub fn failed_exit_code(report: &RunReport, value: &str, step_id: &str) -> Option<i32> {
    match &step(report, value, step_id).state {
        StepState::Failed { failure, .. } => failure.exit_code,
        _ => None,
    }
}
