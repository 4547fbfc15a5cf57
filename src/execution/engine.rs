//! Run engine - fans the matrix out into jobs and aggregates the report

use crate::command::CommandRunner;
use crate::core::{RunState, RunStatus, Workflow};
use crate::execution::{job_runner::JobRunner, report::{JobReport, RunReport}};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

/// Events that occur during a matrix run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        workflow_name: String,
        total_jobs: usize,
    },
    JobStarted {
        value: String,
    },
    StepStarted {
        value: String,
        step_id: String,
    },
    StepCompleted {
        value: String,
        step_id: String,
    },
    StepFailed {
        value: String,
        step_id: String,
        failure: String,
    },
    StepSkipped {
        value: String,
        step_id: String,
        reason: String,
    },
    JobCompleted {
        value: String,
        status: RunStatus,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Main run engine: one job per matrix value, jobs in parallel, steps
/// sequential within each job.
pub struct RunEngine<R> {
    runner: Arc<R>,
    max_parallel: Option<usize>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: CommandRunner + 'static> RunEngine<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            max_parallel: None,
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Bound the number of jobs running at once (default: all of them)
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel.max(1));
        self
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the workflow's entire matrix and return the run report.
    ///
    /// Jobs never share mutable state; a failing job does not cancel its
    /// siblings. The run is Completed iff every job completed.
    pub async fn execute(&self, workflow: &Workflow) -> RunReport {
        let mut state = RunState::new();
        let jobs = workflow.expand_matrix();
        state.start(jobs.len());

        info!(
            "Starting run {} for workflow {} ({} jobs)",
            state.run_id,
            workflow.name,
            jobs.len()
        );
        self.emit(ExecutionEvent::RunStarted {
            run_id: state.run_id,
            workflow_name: workflow.name.clone(),
            total_jobs: jobs.len(),
        })
        .await;

        let limit = self.max_parallel.unwrap_or_else(|| jobs.len().max(1));
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();

        for job in jobs {
            let job_runner =
                JobRunner::new(Arc::clone(&self.runner), Arc::clone(&self.event_handlers));
            let provision = workflow.provision.clone();
            let semaphore = Arc::clone(&semaphore);
            let index = job.index;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, job_runner.run(job, provision).await)
            });
        }

        let mut finished: Vec<(usize, JobReport)> = Vec::with_capacity(state.total_jobs);
        let mut lost_jobs = false;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => finished.push(entry),
                Err(join_error) => {
                    error!("Job task did not finish: {}", join_error);
                    lost_jobs = true;
                }
            }
        }

        // Report jobs in axis order regardless of completion order
        finished.sort_by_key(|(index, _)| *index);
        let job_reports: Vec<JobReport> =
            finished.into_iter().map(|(_, report)| report).collect();

        state.succeeded_jobs = job_reports
            .iter()
            .filter(|j| j.status == RunStatus::Completed)
            .count();
        state.failed_jobs = job_reports
            .iter()
            .filter(|j| j.status == RunStatus::Failed)
            .count();

        if state.failed_jobs > 0 || lost_jobs || state.succeeded_jobs < state.total_jobs {
            state.fail();
        } else {
            state.complete();
        }

        info!("Run {} finished: {:?}", state.run_id, state.status);
        self.emit(ExecutionEvent::RunCompleted {
            run_id: state.run_id,
            status: state.status,
        })
        .await;

        RunReport {
            run_id: state.run_id,
            workflow_name: workflow.name.clone(),
            status: state.status,
            started_at: state.started_at.unwrap_or_else(Utc::now),
            completed_at: state.completed_at.unwrap_or_else(Utc::now),
            jobs: job_reports,
        }
    }
}
