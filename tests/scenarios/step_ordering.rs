//! Test: steps execute in configured order, no reordering

use crate::helpers::*;
use std::sync::Arc;

const EXPECTED_ORDER: [&str; 6] = [
    "pip install .",
    "acme --version",
    "pip install flake8 pytest",
    "flake8 --max-line-length 88 --ignore E203,E501",
    "python setup.py check -m -s",
    "pytest",
];

#[tokio::test]
async fn test_steps_run_in_config_order() {
    let runner = ScriptedRunner::all_success();
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_completed(&report);
    assert_eq!(runner.commands_for("3.6"), EXPECTED_ORDER);
    assert_eq!(runner.commands_for("3.7"), EXPECTED_ORDER);
}

#[tokio::test]
async fn test_report_preserves_step_order() {
    let runner = ScriptedRunner::all_success();
    let report = run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    let ids: Vec<&str> = job(&report, "3.6")
        .steps
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["install", "smoke", "tools", "lint", "package-check", "test"]
    );
}

#[tokio::test]
async fn test_variables_are_rendered_into_commands() {
    let runner = ScriptedRunner::all_success();
    run_matrix(MATRIX_WORKFLOW, Arc::clone(&runner)).await;

    // `{{ package }}` resolved before the command reached the shell
    let commands = runner.commands_for("3.6");
    assert_eq!(commands[1], "acme --version");
    assert!(commands.iter().all(|c| !c.contains("{{")));
}
