//! Run and job reports

use crate::core::{RunStatus, StepState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final record of one step within a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// The rendered command line
    pub command: String,

    /// Terminal state of the step
    pub state: StepState,

    /// Captured standard output (empty when the step never ran)
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl StepReport {
    pub fn completed(&self) -> bool {
        matches!(self.state, StepState::Completed { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.state, StepState::Failed { .. })
    }

    pub fn skipped(&self) -> bool {
        matches!(self.state, StepState::Skipped { .. })
    }
}

/// Final record of one matrix job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// The matrix value this job was bound to
    pub value: String,

    /// Terminal status of the job
    pub status: RunStatus,

    /// Set when the job failed before any step ran
    pub provision_error: Option<String>,

    /// When the job started
    pub started_at: Option<DateTime<Utc>>,

    /// When the job completed or failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Step records in execution order
    pub steps: Vec<StepReport>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// The step that halted this job, if any
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.failed())
    }

    /// Number of steps that completed successfully
    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.completed()).count()
    }
}

/// Final record of one matrix run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Workflow name
    pub workflow_name: String,

    /// Terminal status: Completed iff every job succeeded
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub completed_at: DateTime<Utc>,

    /// Job records in matrix axis order
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| j.succeeded()).count()
    }

    pub fn failed_jobs(&self) -> usize {
        self.jobs.len() - self.succeeded_jobs()
    }

    /// Find a job report by its matrix value
    pub fn job(&self, value: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.value == value)
    }
}
