// src/worktree/git.rs

//! Git command plumbing.
//!
//! Centralized helpers for running `git` as a subprocess with explicit
//! working directories. The process-wide cwd is never mutated.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::worktree::parser::parse_worktree_list;

/// Run a git command and return the raw output.
pub async fn run_git(args: &[&str], cwd: &Path) -> Result<Output> {
    debug!(?args, cwd = ?cwd, "running git");
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .with_context(|| format!("executing git {}", args.join(" ")))
}

/// Run a git command, check for success, and return trimmed stdout.
pub async fn run_git_checked(args: &[&str], cwd: &Path) -> Result<String> {
    let output = run_git(args, cwd).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and return true iff it exited 0.
pub async fn run_git_bool(args: &[&str], cwd: &Path) -> bool {
    run_git(args, cwd)
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Resolve the repository toplevel from any directory inside it.
pub async fn git_root(cwd: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        run_git_checked(&["rev-parse", "--show-toplevel"], cwd).await?,
    ))
}

/// Current branch name; empty on a detached HEAD.
pub async fn current_branch(cwd: &Path) -> Result<String> {
    run_git_checked(&["branch", "--show-current"], cwd).await
}

/// Short HEAD hash of the checkout at `path`, if resolvable.
pub async fn short_head(path: &Path) -> Option<String> {
    let output = run_git(&["rev-parse", "--short", "HEAD"], path).await.ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

/// Git-derived context for a run: repository root, current branch, and
/// whether we are inside a linked (non-main) worktree.
#[derive(Debug, Clone)]
pub struct GitContext {
    pub root: Option<PathBuf>,
    pub branch: String,
    pub in_worktree: bool,
}

impl GitContext {
    /// Probe git for the current context. Failures degrade to an empty
    /// context rather than aborting; steps that need git will fail on
    /// their own terms.
    pub async fn detect(cwd: &Path) -> Self {
        let root = match git_root(cwd).await {
            Ok(root) => Some(root),
            Err(err) => {
                warn!(error = %err, "not inside a git repository");
                None
            }
        };

        let branch = match &root {
            Some(root) => current_branch(root).await.unwrap_or_default(),
            None => String::new(),
        };

        let in_worktree = match &root {
            Some(root) => match run_git_checked(&["worktree", "list", "--porcelain"], root).await {
                Ok(out) => {
                    let worktrees = parse_worktree_list(&out);
                    worktrees
                        .first()
                        .map(|main| &main.path != root)
                        .unwrap_or(false)
                }
                Err(_) => false,
            },
            None => false,
        };

        Self {
            root,
            branch,
            in_worktree,
        }
    }
}
