use std::path::PathBuf;

use ot::config::model::{Step, Workflow};
use ot::engine::{run_workflow, RunContext, StepStatus};
use ot::worktree::WorktreeManager;

fn cmd_step(name: &str, deps: &[&str], cmd: &str) -> Step {
    Step {
        name: name.to_string(),
        description: None,
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
        branches: None,
        cmd: Some(cmd.to_string()),
        worktree_cp: None,
        bun: None,
    }
}

fn test_ctx(root: PathBuf, fail_fast: bool) -> RunContext {
    RunContext {
        git_root: root,
        current_branch: "main".to_string(),
        in_worktree: false,
        fail_fast,
        verbose: false,
    }
}

fn status_of<'a>(outcome: &'a ot::engine::RunOutcome, name: &str) -> StepStatus {
    outcome
        .states
        .iter()
        .find(|s| s.step.name == name)
        .unwrap()
        .status
}

#[tokio::test]
async fn chain_runs_to_completion() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![
        cmd_step("a", &[], "echo a"),
        cmd_step("b", &["a"], "echo b"),
        cmd_step("c", &["b"], "echo c"),
    ]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    for name in ["a", "b", "c"] {
        assert_eq!(status_of(&outcome, name), StepStatus::Done);
    }
}

#[tokio::test]
async fn failure_skips_dependents_and_sets_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![
        cmd_step("broken", &[], "echo boom >&2; exit 1"),
        cmd_step("after", &["broken"], "echo never"),
    ]);
    let ctx = test_ctx(tmp.path().to_path_buf(), false);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(status_of(&outcome, "broken"), StepStatus::Failed);
    assert_eq!(status_of(&outcome, "after"), StepStatus::Skipped);

    let broken = outcome
        .states
        .iter()
        .find(|s| s.step.name == "broken")
        .unwrap();
    assert!(broken.output.contains("boom"));
}

#[tokio::test]
async fn independent_siblings_still_run_without_fail_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![
        cmd_step("bad", &[], "exit 1"),
        cmd_step("good", &[], "echo fine"),
    ]);
    let ctx = test_ctx(tmp.path().to_path_buf(), false);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(status_of(&outcome, "bad"), StepStatus::Failed);
    assert_eq!(status_of(&outcome, "good"), StepStatus::Done);
}

#[tokio::test]
async fn fail_fast_skips_pending_work_after_first_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![
        cmd_step("bad", &[], "exit 1"),
        cmd_step("slow", &[], "sleep 0.5"),
        cmd_step("gated", &["slow"], "echo never"),
    ]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(status_of(&outcome, "bad"), StepStatus::Failed);
    // `slow` was already in flight; fail-fast only refuses new work.
    assert_eq!(status_of(&outcome, "slow"), StepStatus::Done);
    assert_eq!(status_of(&outcome, "gated"), StepStatus::Skipped);
}

#[tokio::test]
async fn branch_filter_skips_step_and_exits_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let mut only_release = cmd_step("deploy", &[], "echo deploy");
    only_release.branches = Some(vec!["release-*".to_string()]);
    let workflow = Workflow::Steps(vec![only_release]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(status_of(&outcome, "deploy"), StepStatus::Skipped);
}

#[tokio::test]
async fn dependents_of_branch_skipped_steps_are_skipped_too() {
    let tmp = tempfile::tempdir().unwrap();
    let mut gated = cmd_step("gated", &[], "echo gated");
    gated.branches = Some(vec!["release-*".to_string()]);
    let workflow = Workflow::Steps(vec![gated, cmd_step("after", &["gated"], "echo after")]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(status_of(&outcome, "gated"), StepStatus::Skipped);
    assert_eq!(status_of(&outcome, "after"), StepStatus::Skipped);
}

#[tokio::test]
async fn step_without_action_fails_immediately() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![Step {
        name: "empty".to_string(),
        description: None,
        depends_on: vec![],
        branches: None,
        cmd: None,
        worktree_cp: None,
        bun: None,
    }]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 1);
    let state = &outcome.states[0];
    assert_eq!(state.status, StepStatus::Failed);
    assert!(state.output.contains("exactly one action"));
}

#[tokio::test]
async fn empty_workflow_exits_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Steps(vec![]);
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert!(outcome.states.is_empty());
}

#[tokio::test]
async fn record_form_workflows_run_the_same() {
    let tmp = tempfile::tempdir().unwrap();
    let workflow = Workflow::Record {
        steps: vec![cmd_step("only", &[], "echo only")],
    };
    let ctx = test_ctx(tmp.path().to_path_buf(), true);
    let manager = WorktreeManager::new(tmp.path().to_path_buf(), None);

    let outcome = run_workflow(&workflow, &ctx, &manager, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(status_of(&outcome, "only"), StepStatus::Done);
}
