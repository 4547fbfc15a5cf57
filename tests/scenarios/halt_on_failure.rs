//! Test: the first failing step halts its job, later steps never run

use crate::helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_install_failure_skips_all_later_steps() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("pip install .", 1)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);

    for value in ["3.6", "3.7"] {
        assert_job_failed_at(&report, value, "install");
        for step_id in ["smoke", "tools", "lint", "package-check", "test"] {
            assert_step_skipped(&report, value, step_id);
        }

        // Nothing after the install reached the shell
        assert_eq!(runner.commands_for(value), ["pip install ."]);
    }
}

#[tokio::test]
async fn test_lint_violation_fails_the_job() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("flake8 --max-line-length", 1)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);

    for value in ["3.6", "3.7"] {
        assert_job_failed_at(&report, value, "lint");
        assert_step_completed(&report, value, "install");
        assert_step_completed(&report, value, "smoke");
        assert_step_completed(&report, value, "tools");
        assert_step_skipped(&report, value, "package-check");
        assert_step_skipped(&report, value, "test");

        // Execution stopped right after the style check
        assert_eq!(runner.commands_for(value).len(), 4);
    }
}

#[tokio::test]
async fn test_failure_carries_the_exit_status() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("python setup.py check", 3)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_eq!(failed_exit_code(&report, "3.6", "package-check"), Some(3));
    assert_eq!(failed_exit_code(&report, "3.7", "package-check"), Some(3));
}

#[tokio::test]
async fn test_smoke_check_failure_halts_before_tooling() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("acme --version", 2)]);
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_job_failed_at(&report, "3.6", "smoke");
    assert_step_completed(&report, "3.6", "install");
    assert_step_skipped(&report, "3.6", "tools");
    assert_eq!(runner.commands_for("3.6").len(), 2);
}
