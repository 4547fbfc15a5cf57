use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use whisker::cli::commands::{
    HistoryCommand, InitCommand, ListCommand, RunCommand, ValidateCommand,
};
use whisker::cli::output::{
    create_progress_bar, format_duration, format_execution_event, format_job_summary,
    format_run_summary, format_status, style, CHECK, CROSS, INFO, WARN,
};
use whisker::cli::{Cli, Command};
use whisker::command::ShellRunner;
use whisker::core::config::{Trigger, WorkflowConfig, STARTER_WORKFLOW};
use whisker::core::RunStatus;
use whisker::execution::ExecutionEvent;
use whisker::persistence::{create_summary, PersistenceBackend, RunSummary};
use whisker::RunEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
        Command::Init(cmd) => init_workflow(cmd)?,
        Command::List(cmd) => list_workflows(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    use whisker::persistence::SqliteRunStore;
    Ok(Arc::new(SqliteRunStore::with_default_path().await?))
}

#[cfg(not(feature = "sqlite"))]
async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    use whisker::persistence::InMemoryRunStore;
    Ok(Arc::new(InMemoryRunStore::new()))
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    // Load workflow config
    let config =
        WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow config")?;

    println!("{} Loaded workflow: {}", INFO, style(&config.name).bold());

    let mut workflow = config.to_workflow();

    // Apply variable overrides
    for (key, value) in &cmd.variable {
        workflow.variables.insert(key.clone(), value.clone());
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    // The workflow only runs when its trigger matches the event
    let event: Trigger = cmd.event.into();
    if !workflow.handles(event) {
        println!(
            "{} {} does not run on {:?} events, nothing to do",
            INFO,
            style(&workflow.name).bold(),
            event
        );
        return Ok(());
    }

    // Create the engine over the system shell
    let runner = Arc::new(ShellRunner::new());
    let mut engine = RunEngine::new(runner);
    if let Some(max_parallel) = cmd.max_parallel {
        engine = engine.with_max_parallel(max_parallel);
    }

    // Progress bar over every step of every job, fed by events
    let total_steps = workflow.axis.len() * workflow.steps.len();
    let progress = create_progress_bar(total_steps);
    let progress_events = progress.clone();
    engine
        .add_event_handler(move |event| {
            progress_events.println(format_execution_event(&event));
            if matches!(
                event,
                ExecutionEvent::StepCompleted { .. }
                    | ExecutionEvent::StepFailed { .. }
                    | ExecutionEvent::StepSkipped { .. }
            ) {
                progress_events.inc(1);
            }
        })
        .await;

    println!();
    let report = engine.execute(&workflow).await;
    progress.finish_and_clear();

    // Per-job summary
    println!();
    for job in &report.jobs {
        println!("  {}", format_job_summary(job));
    }

    // Save to history
    if !cmd.no_history {
        let summary = create_summary(&report);
        match save_to_history(&summary).await {
            Ok(()) => println!(
                "\n{} Run saved to history (ID: {})",
                INFO,
                style(&summary.run_id.to_string()[..8]).dim()
            ),
            Err(e) => warn!("Could not save run history: {}", e),
        }
    }

    if cmd.json {
        println!("\n{}", serde_json::to_string_pretty(&report)?);
    }

    // Print final status; the process exit code is the AND across all jobs
    if report.succeeded() {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(&workflow.name).bold(),
            style("successfully").green()
        );
    } else {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&workflow.name).bold(),
            style("failed").red()
        );
        std::process::exit(1);
    }

    Ok(())
}

async fn save_to_history(summary: &RunSummary) -> Result<()> {
    let store = open_history().await?;
    store.save_run(summary).await
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Workflow configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Jobs: {}", style(config.axis().len()).cyan());
            println!("  Steps: {}", style(config.steps.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn init_workflow(cmd: &InitCommand) -> Result<()> {
    let path = std::path::Path::new(&cmd.file);
    if path.exists() && !cmd.force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            WARN,
            style(&cmd.file).bold()
        );
        std::process::exit(1);
    }

    std::fs::write(path, STARTER_WORKFLOW).context("Failed to write workflow file")?;
    println!(
        "{} Wrote starter workflow to {}",
        CHECK,
        style(&cmd.file).bold()
    );

    Ok(())
}

async fn list_workflows(cmd: &ListCommand) -> Result<()> {
    let store = open_history().await?;
    let workflows = store.list_workflows().await?;

    if workflows.is_empty() {
        println!("{} No runs recorded yet", INFO);
        return Ok(());
    }

    println!("{} Workflows with recorded runs:", INFO);

    for workflow_name in &workflows {
        let runs = store.list_runs(workflow_name).await?;

        if cmd.with_counts {
            let completed = runs
                .iter()
                .filter(|r| r.status == RunStatus::Completed)
                .count();
            let failed = runs
                .iter()
                .filter(|r| r.status == RunStatus::Failed)
                .count();
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(workflow_name).bold(),
                style(runs.len()).cyan(),
                style(completed).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(workflow_name).bold());
        }
    }

    if cmd.json {
        let mut json_data = Vec::new();
        for workflow_name in &workflows {
            let runs = store.list_runs(workflow_name).await.ok();
            json_data.push(serde_json::json!({
                "name": workflow_name,
                "run_count": runs.as_ref().map(|r| r.len()).unwrap_or(0)
            }));
        }
        let data = serde_json::json!({ "workflows": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_history().await?;

    // If a specific run ID is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) => print_run_details(&summary, cmd.verbose)?,
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    // List runs for one workflow or all of them
    let runs = if let Some(workflow_name) = &cmd.workflow {
        store.list_runs(workflow_name).await?
    } else {
        let workflows = store.list_workflows().await?;
        let mut all_runs = Vec::new();
        for workflow_name in &workflows {
            all_runs.extend(store.list_runs(workflow_name).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs
    };
    let runs: Vec<RunSummary> = runs.into_iter().take(cmd.limit).collect();

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, verbose: bool) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Workflow: {}", style(&summary.workflow_name).bold());
    println!("  Status: {}", format_status(summary.status));
    println!(
        "  Started: {}",
        style(summary.started_at.to_rfc3339()).dim()
    );
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Jobs: {} ({} succeeded, {} failed)",
        summary.total_jobs, summary.succeeded_jobs, summary.failed_jobs
    );

    if verbose {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}
