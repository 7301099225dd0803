// src/engine/scheduler.rs

//! The step scheduler.
//!
//! Drives a workflow's steps with maximum safe parallelism: a
//! scan-and-launch loop dispatches every pending step whose dependencies
//! are all done, then waits on an event channel for at least one running
//! action to settle before re-scanning. The renderer is only ever
//! touched from this control loop, so its state needs no locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use colored::Colorize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::StepStatus;
use crate::branch::should_run;
use crate::config::model::{Step, StepAction, Workflow};
use crate::dag::resolve_steps;
use crate::exec::{self, ActionResult};
use crate::render::{format_duration, ProgressRenderer};
use crate::worktree::WorktreeManager;

/// Mutable per-step state, owned by the scheduler for the duration of a
/// run. The renderer sees patches, never this record.
#[derive(Debug, Clone)]
pub struct StepState {
    pub step: Step,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub output: String,
}

/// Result of a whole workflow run.
#[derive(Debug)]
pub struct RunOutcome {
    /// One state per resolved step, in declaration order.
    pub states: Vec<StepState>,
    pub exit_code: i32,
}

/// Inputs that stay fixed for the duration of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub git_root: PathBuf,
    pub current_branch: String,
    pub in_worktree: bool,
    pub fail_fast: bool,
    pub verbose: bool,
}

/// Events flowing from running actions back into the control loop.
#[derive(Debug)]
pub enum StepEvent {
    NestedRegistered {
        step: String,
        tasks: Vec<String>,
    },
    NestedStarted {
        step: String,
        task: String,
    },
    NestedFinished {
        step: String,
        task: String,
        success: bool,
        duration_ms: u64,
    },
    Finished {
        step: String,
        result: ActionResult,
    },
}

/// Handle a workspace-script executor uses to report per-task progress.
/// Updates travel over the scheduler's event channel so the renderer is
/// only driven from the control loop.
#[derive(Clone)]
pub struct NestedProgress {
    step: String,
    tx: mpsc::Sender<StepEvent>,
}

impl NestedProgress {
    pub fn new(step: String, tx: mpsc::Sender<StepEvent>) -> Self {
        Self { step, tx }
    }

    pub async fn registered(&self, tasks: Vec<String>) {
        let _ = self
            .tx
            .send(StepEvent::NestedRegistered {
                step: self.step.clone(),
                tasks,
            })
            .await;
    }

    pub async fn started(&self, task: String) {
        let _ = self
            .tx
            .send(StepEvent::NestedStarted {
                step: self.step.clone(),
                task,
            })
            .await;
    }

    pub async fn finished(&self, task: String, success: bool, duration_ms: u64) {
        let _ = self
            .tx
            .send(StepEvent::NestedFinished {
                step: self.step.clone(),
                task,
                success,
                duration_ms,
            })
            .await;
    }
}

/// Run every step of `workflow`, honoring dependencies, branch filters
/// and the fail-fast policy. Returns all step states plus the exit code
/// (1 iff any step failed).
pub async fn run_workflow(
    workflow: &Workflow,
    ctx: &RunContext,
    manager: &WorktreeManager,
    mut renderer: Option<&mut ProgressRenderer>,
) -> crate::errors::Result<RunOutcome> {
    let steps = workflow.steps();
    let names: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
    let resolved = resolve_steps(steps, &names)?;

    let run_started = Instant::now();

    let mut states: Vec<StepState> = resolved
        .iter()
        .map(|step| {
            let status = if should_run(
                step.branches.as_deref(),
                &ctx.current_branch,
                ctx.in_worktree,
            ) {
                StepStatus::Pending
            } else {
                info!(step = %step.name, branch = %ctx.current_branch, "branch filter rejected step");
                StepStatus::Skipped
            };
            StepState {
                step: (*step).clone(),
                status,
                duration_ms: 0,
                output: String::new(),
            }
        })
        .collect();

    let name_to_idx: HashMap<String, usize> = states
        .iter()
        .enumerate()
        .map(|(i, s)| (s.step.name.clone(), i))
        .collect();

    if let Some(r) = renderer.as_mut() {
        for st in &states {
            r.add_step(&st.step.name, st.status);
        }
        r.render();
    }

    let (tx, mut rx) = mpsc::channel::<StepEvent>(64);
    let mut running = 0usize;

    loop {
        // Scan to fixpoint: mark skips, then launch every ready step.
        loop {
            let mut changed = false;
            let any_failed = states.iter().any(|s| s.status == StepStatus::Failed);

            for i in 0..states.len() {
                if states[i].status != StepStatus::Pending {
                    continue;
                }

                if ctx.fail_fast && any_failed {
                    states[i].status = StepStatus::Skipped;
                    info!(step = %states[i].step.name, "fail-fast tripped; skipping");
                    if let Some(r) = renderer.as_mut() {
                        r.update_step(&states[i].step.name, StepStatus::Skipped, None);
                    }
                    changed = true;
                    continue;
                }

                // Only dependencies inside the resolved set count.
                let dep_statuses: Vec<StepStatus> = states[i]
                    .step
                    .depends_on
                    .iter()
                    .filter_map(|dep| name_to_idx.get(dep))
                    .map(|&j| states[j].status)
                    .collect();

                if dep_statuses
                    .iter()
                    .any(|s| matches!(s, StepStatus::Failed | StepStatus::Skipped))
                {
                    states[i].status = StepStatus::Skipped;
                    info!(step = %states[i].step.name, "dependency failed or skipped; skipping");
                    if let Some(r) = renderer.as_mut() {
                        r.update_step(&states[i].step.name, StepStatus::Skipped, None);
                    }
                    changed = true;
                    continue;
                }

                if dep_statuses.iter().all(|s| *s == StepStatus::Done) {
                    states[i].status = StepStatus::Running;
                    debug!(step = %states[i].step.name, "dependencies satisfied; launching");
                    if let Some(r) = renderer.as_mut() {
                        r.update_step(&states[i].step.name, StepStatus::Running, None);
                    }
                    running += 1;
                    changed = true;

                    let step = states[i].step.clone();
                    let tx_task = tx.clone();
                    let manager = manager.clone();
                    let git_root = ctx.git_root.clone();
                    let verbose = ctx.verbose;
                    tokio::spawn(async move {
                        let result =
                            run_step_action(&step, &git_root, &manager, verbose, &tx_task).await;
                        let _ = tx_task
                            .send(StepEvent::Finished {
                                step: step.name.clone(),
                                result,
                            })
                            .await;
                    });
                }
            }

            if !changed {
                break;
            }
        }

        if running == 0 {
            let stranded: Vec<String> = states
                .iter()
                .filter(|s| s.status == StepStatus::Pending)
                .map(|s| s.step.name.clone())
                .collect();
            if !stranded.is_empty() {
                error!(
                    ?stranded,
                    "scheduler exited with pending steps; dependency graph is inconsistent"
                );
                debug_assert!(
                    stranded.is_empty(),
                    "pending steps remained at scheduler exit: {stranded:?}"
                );
            }
            break;
        }

        // Wait for at least one running action to settle (or report
        // nested progress) before re-scanning.
        match rx.recv().await {
            Some(StepEvent::Finished { step, result }) => {
                running -= 1;
                if let Some(&i) = name_to_idx.get(&step) {
                    let status = if result.success {
                        StepStatus::Done
                    } else {
                        StepStatus::Failed
                    };
                    let duration_ms = result.duration_ms;
                    states[i].status = status;
                    states[i].duration_ms = duration_ms;
                    states[i].output = result.output;
                    match status {
                        StepStatus::Done => {
                            info!(step = %step, duration_ms, "step completed")
                        }
                        _ => warn!(step = %step, duration_ms, "step failed"),
                    }
                    if let Some(r) = renderer.as_mut() {
                        r.update_step(&step, status, Some(duration_ms));
                    }
                }
            }
            Some(StepEvent::NestedRegistered { step, tasks }) => {
                if let Some(r) = renderer.as_mut() {
                    r.register_nested(&step, &tasks);
                }
            }
            Some(StepEvent::NestedStarted { step, task }) => {
                if let Some(r) = renderer.as_mut() {
                    r.update_nested(&step, &task, StepStatus::Running, None);
                }
            }
            Some(StepEvent::NestedFinished {
                step,
                task,
                success,
                duration_ms,
            }) => {
                let status = if success {
                    StepStatus::Done
                } else {
                    StepStatus::Failed
                };
                if let Some(r) = renderer.as_mut() {
                    r.update_nested(&step, &task, status, Some(duration_ms));
                }
            }
            None => break,
        }
    }

    if let Some(r) = renderer.as_mut() {
        r.cleanup();
    }

    // Failure details are suppressed during the run to keep the TTY
    // frame tidy; print them now unless verbose already streamed them.
    if !ctx.verbose {
        for st in states.iter().filter(|s| s.status == StepStatus::Failed) {
            println!();
            println!("{}", "─".repeat(60).red());
            println!("{}", format!("FAILED: {}", st.step.name).red().bold());
            println!("{}", "─".repeat(60).red());
            let trimmed = st.output.trim_end();
            if !trimmed.is_empty() {
                println!("{trimmed}");
            }
        }
    }

    let passed = states.iter().filter(|s| s.status == StepStatus::Done).count();
    let failed = states
        .iter()
        .filter(|s| s.status == StepStatus::Failed)
        .count();
    let skipped = states
        .iter()
        .filter(|s| s.status == StepStatus::Skipped)
        .count();
    let total_ms = run_started.elapsed().as_millis() as u64;

    println!();
    let summary = format!(
        "{passed} passed, {failed} failed, {skipped} skipped in {}",
        format_duration(total_ms)
    );
    if failed > 0 {
        println!("{}", summary.red().bold());
    } else {
        println!("{}", summary.green().bold());
    }

    Ok(RunOutcome {
        states,
        exit_code: if failed > 0 { 1 } else { 0 },
    })
}

/// Dispatch a step to its executor. Steps with zero or several actions
/// fail immediately with an explanatory message.
async fn run_step_action(
    step: &Step,
    git_root: &Path,
    manager: &WorktreeManager,
    verbose: bool,
    tx: &mpsc::Sender<StepEvent>,
) -> ActionResult {
    match step.action() {
        Some(StepAction::Cmd(cmd)) => exec::command::run_cmd(cmd, git_root, verbose).await,
        Some(StepAction::WorktreeCp(action)) => {
            exec::copy::run_worktree_cp(action, manager, verbose).await
        }
        Some(StepAction::Script(action)) => {
            let progress = NestedProgress::new(step.name.clone(), tx.clone());
            exec::script::run_workspace_script(action, git_root, verbose, Some(&progress)).await
        }
        None => ActionResult::failure(
            format!(
                "step '{}' must define exactly one action (cmd, worktree:cp, or bun)",
                step.name
            ),
            0,
        ),
    }
}
