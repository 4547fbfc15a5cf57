//! Test: matrix fan-out - one job per axis value, exactly once

use crate::helpers::*;
use std::sync::Arc;
use whisker::core::config::WorkflowConfig;

#[tokio::test]
async fn test_one_job_per_matrix_value() {
    let runner = ScriptedRunner::all_success();
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_completed(&report);
    assert_eq!(report.jobs.len(), 2);

    let values: Vec<&str> = report.jobs.iter().map(|j| j.value.as_str()).collect();
    assert_eq!(values, vec!["3.6", "3.7"]);
}

#[tokio::test]
async fn test_all_steps_succeed_for_both_jobs() {
    let runner = ScriptedRunner::all_success();
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_completed(&report);
    assert_job_succeeded(&report, "3.6");
    assert_job_succeeded(&report, "3.7");
    assert_eq!(job(&report, "3.6").completed_steps(), 6);
    assert_eq!(job(&report, "3.7").completed_steps(), 6);
}

#[tokio::test]
async fn test_jobs_see_their_own_matrix_value() {
    let runner = ScriptedRunner::all_success();
    run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    // Six step commands per value, each carrying its own binding
    assert_eq!(runner.commands_for("3.6").len(), 6);
    assert_eq!(runner.commands_for("3.7").len(), 6);

    for recorded in runner.recorded() {
        let bound = recorded.env.get("MATRIX_PYTHON");
        assert_eq!(bound.map(|v| v.as_str()), recorded.value.as_deref());
    }
}

#[tokio::test]
async fn test_single_value_matrix_runs_one_job() {
    let yaml = r#"
name: "Single"
on: push
matrix:
  python: ["3.6"]
steps:
  - id: "only"
    name: "Only step"
    run: "true"
"#;

    let config = WorkflowConfig::from_yaml(yaml).unwrap();
    let workflow = config.to_workflow();

    let runner = ScriptedRunner::all_success();
    let engine = whisker::execution::RunEngine::new(Arc::clone(&runner));
    let report = engine.execute(&workflow).await;

    assert_run_completed(&report);
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].value, "3.6");
}
