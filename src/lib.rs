// src/lib.rs

pub mod branch;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fsutil;
pub mod logging;
pub mod render;
pub mod workspace;
pub mod worktree;

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tracing::debug;

use crate::cli::{CliArgs, OtCommand, WtCommand};
use crate::config::model::{StepAction, Workflow};
use crate::dag::{layer, resolve_steps};
use crate::engine::{run_workflow, RunContext};
use crate::render::ProgressRenderer;
use crate::worktree::{AddOptions, GitContext, RemoveOptions, WorktreeManager};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery and loading
/// - git context detection (root, branch, worktree flag)
/// - the step scheduler and progress renderer
/// - the `wt` and `schema` sub-commands
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> anyhow::Result<i32> {
    if args.no_color {
        colored::control::set_override(false);
    }

    match &args.command {
        Some(OtCommand::Schema) => {
            println!("{}", config::schema::CONFIG_SCHEMA);
            return Ok(0);
        }
        Some(OtCommand::Wt { action }) => {
            return run_worktree_command(&args, action.clone()).await;
        }
        None => {}
    }

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let git = GitContext::detect(&cwd).await;

    let explicit = args.config.as_deref().map(Path::new);
    let (cfg, config_path) = config::load_config(explicit, &cwd, git.root.as_deref())?;
    debug!(path = ?config_path, "loaded config");

    let Some(job) = args.job_name() else {
        eprintln!("error: no job specified");
        print_available_workflows(&cfg);
        return Ok(1);
    };

    let Some(workflow) = cfg.workflows.get(job) else {
        eprintln!("error: unknown job '{job}'");
        print_available_workflows(&cfg);
        return Ok(1);
    };

    if args.graph {
        print_graph(job, workflow)?;
        return Ok(0);
    }

    let git_root = git.root.clone().unwrap_or_else(|| cwd.clone());
    let manager = WorktreeManager::new(git_root.clone(), cfg.worktree.as_ref());
    let ctx = RunContext {
        git_root,
        current_branch: git.branch.clone(),
        in_worktree: git.in_worktree,
        fail_fast: args.fail_fast,
        verbose: args.verbose,
    };

    // Verbose streams child output straight to stdout, so the diff
    // renderer drops to its print-once mode.
    let mut renderer = if args.verbose {
        ProgressRenderer::with_tty(false)
    } else {
        ProgressRenderer::new()
    };

    let outcome = run_workflow(workflow, &ctx, &manager, Some(&mut renderer)).await?;
    Ok(outcome.exit_code)
}

fn print_available_workflows(cfg: &config::model::Config) {
    if cfg.workflows.is_empty() {
        return;
    }
    eprintln!("available workflows:");
    for name in cfg.workflows.keys() {
        eprintln!("  - {name}");
    }
}

/// Print the resolved step DAG of a job: steps in execution order with
/// their metadata, followed by the parallel groups the scheduler would
/// dispatch.
fn print_graph(job: &str, workflow: &Workflow) -> crate::errors::Result<()> {
    let steps = workflow.steps();
    let names: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
    let resolved = resolve_steps(steps, &names)?;

    println!("workflow {job} ({} steps):", resolved.len());
    for step in &resolved {
        println!("  - {}", step.name.bold());
        if let Some(description) = &step.description {
            println!("      {description}");
        }
        if !step.depends_on.is_empty() {
            println!("      dependsOn: {:?}", step.depends_on);
        }
        if let Some(branches) = &step.branches {
            println!("      branches: {branches:?}");
        }
        match step.action() {
            Some(StepAction::Cmd(cmd)) => println!("      cmd: {cmd}"),
            Some(StepAction::WorktreeCp(action)) => {
                println!("      worktree:cp from {} ({} pattern(s))", action.from, action.files.len());
            }
            Some(StepAction::Script(action)) => println!("      bun: {}", action.script),
            None => println!("      (no action)"),
        }
    }

    let owned: Vec<config::model::Step> = resolved.iter().map(|s| (*s).clone()).collect();
    let groups = layer(&owned)?;
    println!();
    println!("parallel groups:");
    for (i, group) in groups.iter().enumerate() {
        let names: Vec<&str> = group.iter().map(|s| s.name.as_str()).collect();
        println!("  {}: {}", i + 1, names.join(", "));
    }

    Ok(())
}

async fn run_worktree_command(args: &CliArgs, action: WtCommand) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let root = worktree::git::git_root(&cwd)
        .await
        .context("not inside a git repository")?;

    // Worktree commands work without a config; one only contributes
    // base_dir and hooks when present.
    let explicit = args.config.as_deref().map(Path::new);
    let section = config::load_config(explicit, &cwd, Some(&root))
        .ok()
        .and_then(|(cfg, _)| cfg.worktree);

    let manager = WorktreeManager::new(root, section.as_ref());

    match action {
        WtCommand::Add {
            branch,
            new_branch,
            base,
            force,
        } => {
            manager
                .add(
                    &branch,
                    &AddOptions {
                        new_branch,
                        force,
                        base,
                    },
                )
                .await?;
            Ok(0)
        }
        WtCommand::Remove {
            branch,
            force,
            with_branch,
        } => {
            manager
                .remove(
                    &branch,
                    &RemoveOptions {
                        force,
                        delete_branch: with_branch,
                    },
                )
                .await?;
            Ok(0)
        }
        WtCommand::List => {
            let listings = manager.list().await?;
            println!("Git worktrees:");
            println!("{}", "─".repeat(60).dimmed());
            for listing in &listings {
                let branch = listing
                    .info
                    .branch
                    .clone()
                    .unwrap_or_else(|| "(detached)".to_string());
                let marker = if listing.info.is_main { " (main)" } else { "" };
                println!(
                    "  {} {} {}{}",
                    branch.bold(),
                    listing.info.path.display(),
                    listing.head.dimmed(),
                    marker
                );
            }
            Ok(0)
        }
        WtCommand::Cp { src, dest } => {
            manager.copy(&src, &dest, &cwd).await?;
            Ok(0)
        }
    }
}
