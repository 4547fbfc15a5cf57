//! CLI output formatting

use crate::core::{RunStatus, StepState};
use crate::execution::{ExecutionEvent, JobReport};
use crate::persistence::RunSummary;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the run's total step count
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a run summary line for history listings
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Completed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
        _ => INFO,
    };

    format!(
        "{} {} - {} - {} ({}/{} jobs)",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.workflow_name).bold(),
        format_status(summary.status),
        summary.succeeded_jobs,
        summary.total_jobs,
    )
}

/// One line per finished job for the end-of-run summary
pub fn format_job_summary(job: &JobReport) -> String {
    if job.succeeded() {
        return format!(
            "{} [{}] {}/{} steps",
            CHECK,
            style(&job.value).cyan(),
            job.completed_steps(),
            job.steps.len()
        );
    }

    if let Some(error) = &job.provision_error {
        return format!(
            "{} [{}] {}",
            CROSS,
            style(&job.value).cyan(),
            style(error).red()
        );
    }

    match job.failed_step() {
        Some(step) => format!(
            "{} [{}] failed at {} ({})",
            CROSS,
            style(&job.value).cyan(),
            style(&step.id).red(),
            failure_message(&step.state)
        ),
        None => format!("{} [{}] failed", CROSS, style(&job.value).cyan()),
    }
}

fn failure_message(state: &StepState) -> String {
    match state {
        StepState::Failed { failure, .. } => failure.message.clone(),
        _ => String::new(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            workflow_name,
            total_jobs,
        } => format!(
            "{} Starting {} ({}) with {} jobs",
            ROCKET,
            style(workflow_name).bold(),
            style(&run_id.to_string()[..8]).dim(),
            style(total_jobs).cyan()
        ),
        ExecutionEvent::JobStarted { value } => {
            format!("{} [{}] job started", SPINNER, style(value).cyan())
        }
        ExecutionEvent::StepStarted { value, step_id } => {
            format!("{} [{}] {}", SPINNER, style(value).cyan(), step_id)
        }
        ExecutionEvent::StepCompleted { value, step_id } => {
            format!("{} [{}] {}", CHECK, style(value).cyan(), style(step_id).green())
        }
        ExecutionEvent::StepFailed {
            value,
            step_id,
            failure,
        } => format!(
            "{} [{}] {}: {}",
            CROSS,
            style(value).cyan(),
            style(step_id).red(),
            style(failure).dim()
        ),
        ExecutionEvent::StepSkipped {
            value,
            step_id,
            reason,
        } => format!(
            "{} [{}] {} skipped ({})",
            INFO,
            style(value).cyan(),
            style(step_id).dim(),
            reason
        ),
        ExecutionEvent::JobCompleted { value, status } => {
            let icon = match status {
                RunStatus::Completed => CHECK,
                _ => CROSS,
            };
            format!(
                "{} [{}] job {}",
                icon,
                style(value).cyan(),
                format_status(*status)
            )
        }
        ExecutionEvent::RunCompleted { run_id, status } => {
            let status_str = match status {
                RunStatus::Completed => format!("completed {}", style("successfully").green()),
                RunStatus::Failed => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Run ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
