//! Test: per-version environment provisioning

use crate::helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_provision_runs_before_any_step() {
    let runner = ScriptedRunner::all_success();
    let report = run_matrix(PROVISIONED_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_completed(&report);

    let recorded = runner.recorded();
    for version in ["3.6", "3.7"] {
        let check = recorded
            .iter()
            .position(|r| r.command == format!("python{} --version", version))
            .expect("interpreter check should run");
        let venv = recorded
            .iter()
            .position(|r| r.command.starts_with(&format!("python{} -m venv ", version)))
            .expect("venv creation should run");
        let first_step = recorded
            .iter()
            .position(|r| r.value.as_deref() == Some(version))
            .expect("steps should run");

        assert!(check < venv);
        assert!(venv < first_step);
    }
}

#[tokio::test]
async fn test_steps_run_inside_the_virtualenv() {
    let runner = ScriptedRunner::all_success();
    run_matrix(PROVISIONED_WORKFLOW, Arc::clone(&runner)).await;

    let install = runner
        .recorded()
        .into_iter()
        .find(|r| r.value.as_deref() == Some("3.6") && r.command == "pip install .")
        .expect("install step should run");

    assert!(install.env.contains_key("VIRTUAL_ENV"));
    let path = install.env.get("PATH").expect("PATH should be overridden");
    assert!(path.contains("venv"));
}

#[tokio::test]
async fn test_missing_interpreter_fails_only_its_job() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("python3.7 --version", 127)]);
    let report = run_matrix(PROVISIONED_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_job_succeeded(&report, "3.6");

    let failed = job(&report, "3.7");
    assert!(!failed.succeeded());
    let error = failed.provision_error.as_ref().expect("provision error");
    assert!(error.contains("python3.7"));

    // Every step of the unprovisioned job was skipped, none reached the shell
    assert!(failed.steps.iter().all(|s| s.skipped()));
    assert!(runner.commands_for("3.7").is_empty());
}

#[tokio::test]
async fn test_venv_failure_fails_the_job() {
    let runner = ScriptedRunner::with_rules(vec![Rule::fail("python3.6 -m venv", 1)]);
    let report = run_matrix(PROVISIONED_WORKFLOW, Arc::clone(&runner)).await;

    assert_run_failed(&report);
    assert_job_succeeded(&report, "3.7");

    let failed = job(&report, "3.6");
    assert!(failed.provision_error.is_some());
    assert!(runner.commands_for("3.6").is_empty());
}
