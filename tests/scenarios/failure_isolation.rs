//! Test: matrix jobs are isolated - one failing job never stops the other

use crate::helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_test_suite_failure_on_one_version_only() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail_for("3.7", "pytest", 1)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    // One failed job, one succeeded job, overall run failed
    assert_run_failed(&report);
    assert_job_succeeded(&report, "3.6");
    assert_job_failed_at(&report, "3.7", "test");
    assert_eq!(report.succeeded_jobs(), 1);
    assert_eq!(report.failed_jobs(), 1);

    // The healthy job still ran its full sequence
    assert_eq!(runner.commands_for("3.6").len(), 6);
    assert_eq!(job(&report, "3.6").completed_steps(), 6);

    // The failing job stopped at its last step, which had already started
    assert_eq!(runner.commands_for("3.7").len(), 6);
    assert_eq!(job(&report, "3.7").completed_steps(), 5);
}

#[tokio::test]
async fn test_early_failure_does_not_block_the_sibling() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail_for("3.6", "pip install .", 1)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_job_failed_at(&report, "3.6", "install");
    assert_eq!(runner.commands_for("3.6").len(), 1);

    assert_job_succeeded(&report, "3.7");
    assert_eq!(runner.commands_for("3.7").len(), 6);
}

#[tokio::test]
async fn test_both_jobs_failing_still_reports_both() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("pytest", 1)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_eq!(report.failed_jobs(), 2);
    assert_job_failed_at(&report, "3.6", "test");
    assert_job_failed_at(&report, "3.7", "test");
}
