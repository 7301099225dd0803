// src/exec/script.rs

//! Workspace-script executor: fan a named script out across all
//! workspace packages that define it, layer the per-package tasks by
//! their dependency spec, and run each layer in parallel.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use futures::future::join_all;
use tracing::{debug, info};

use super::command::run_cmd;
use super::ActionResult;
use crate::config::model::WorkspaceScriptAction;
use crate::dag::layer;
use crate::engine::scheduler::NestedProgress;
use crate::workspace::{build_task_nodes, discover_workspaces, TaskNode};

/// Run a workspace-script action rooted at `root`.
///
/// When a `progress` handle is given, one nested task per node is
/// registered up front and flipped through running/done/failed as the
/// layers execute.
pub async fn run_workspace_script(
    action: &WorkspaceScriptAction,
    root: &Path,
    verbose: bool,
    progress: Option<&NestedProgress>,
) -> ActionResult {
    let started = Instant::now();
    match script_inner(action, root, verbose, progress).await {
        Ok((success, output)) => ActionResult {
            success,
            output,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Err(err) => ActionResult::failure(
            format!("{err:#}"),
            started.elapsed().as_millis() as u64,
        ),
    }
}

async fn script_inner(
    action: &WorkspaceScriptAction,
    root: &Path,
    verbose: bool,
    progress: Option<&NestedProgress>,
) -> Result<(bool, String)> {
    let packages = discover_workspaces(root)?;
    let nodes = build_task_nodes(&action.script, &action.depends_on, &packages);
    if nodes.is_empty() {
        bail!("no workspace package has a '{}' script", action.script);
    }

    // The layerer closes over the combined set, so `^script` fans out
    // transitively even though the builder only emits immediate edges.
    let layers = layer(&nodes).map_err(|e| anyhow!(e))?;

    let commands: HashMap<String, String> = nodes
        .iter()
        .filter_map(|node| {
            packages
                .iter()
                .find(|p| p.name == node.package_name)
                .and_then(|p| p.scripts.get(&node.script))
                .map(|cmd| (node.id(), cmd.clone()))
        })
        .collect();

    if let Some(p) = progress {
        p.registered(nodes.iter().map(TaskNode::id).collect()).await;
    }

    info!(
        script = %action.script,
        tasks = nodes.len(),
        layers = layers.len(),
        "running workspace script"
    );

    let mut all_ok = true;
    let mut lines: Vec<String> = Vec::new();

    for layer_nodes in &layers {
        if let Some(p) = progress {
            for node in layer_nodes {
                p.started(node.id()).await;
            }
        }

        let futures: Vec<_> = layer_nodes
            .iter()
            .map(|node| {
                let cmd = commands.get(&node.id()).cloned().unwrap_or_default();
                run_script_task(cmd, node.package_path.clone(), action.timeout, verbose)
            })
            .collect();

        let results = join_all(futures).await;

        for (node, result) in layer_nodes.iter().zip(results) {
            if let Some(p) = progress {
                p.finished(node.id(), result.success, result.duration_ms).await;
            }
            if result.success {
                lines.push(format!("Completed {} in {}ms", node.id(), result.duration_ms));
            } else {
                all_ok = false;
                let first = result.output.lines().next().unwrap_or("").to_string();
                lines.push(format!("Failed {}: {first}", node.id()));
            }
        }

        // A failed layer stops everything downstream.
        if !all_ok {
            break;
        }
    }

    Ok((all_ok, lines.join("\n")))
}

/// Run one task command under its package directory, racing the
/// optional per-task timeout. A fired timer fails the task; the child
/// is killed on drop.
async fn run_script_task(
    cmd: String,
    cwd: std::path::PathBuf,
    timeout_ms: Option<u64>,
    verbose: bool,
) -> ActionResult {
    debug!(cmd = %cmd, cwd = ?cwd, "starting workspace task");
    match timeout_ms {
        Some(ms) => {
            match tokio::time::timeout(Duration::from_millis(ms), run_cmd(&cmd, &cwd, verbose))
                .await
            {
                Ok(result) => result,
                Err(_) => ActionResult::failure(format!("Timeout after {ms}ms"), ms),
            }
        }
        None => run_cmd(&cmd, &cwd, verbose).await,
    }
}
