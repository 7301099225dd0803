// src/worktree/manager.rs

//! Worktree manager: add/remove/list/copy plus post-create hooks.
//!
//! All destinations resolved by `copy` are checked to stay inside their
//! worktree root before anything is written.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::{debug, info, warn};

use crate::config::model::{Hook, WorktreeSection};
use crate::errors::OtError;
use crate::exec::shell_command;
use crate::fsutil;
use crate::worktree::git::{run_git_checked, short_head};
use crate::worktree::parser::{parse_worktree_list, WorktreeInfo};

const DEFAULT_BASE_DIR: &str = "../worktrees";

/// A listed worktree, augmented with its short HEAD hash.
#[derive(Debug, Clone)]
pub struct WorktreeListing {
    pub info: WorktreeInfo,
    pub head: String,
}

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub new_branch: bool,
    pub force: bool,
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub force: bool,
    pub delete_branch: bool,
}

/// Owns no mutable state beyond its configuration; every git call gets
/// an explicit working directory.
#[derive(Debug, Clone)]
pub struct WorktreeManager {
    git_root: PathBuf,
    base_dir: PathBuf,
    hooks: Vec<Hook>,
}

impl WorktreeManager {
    pub fn new(git_root: PathBuf, section: Option<&WorktreeSection>) -> Self {
        let base = section
            .and_then(|s| s.defaults.base_dir.as_deref())
            .unwrap_or(DEFAULT_BASE_DIR);
        let base_dir = git_root.join(base);
        let hooks = section
            .map(|s| s.hooks.post_create.clone())
            .unwrap_or_default();

        Self {
            git_root,
            base_dir,
            hooks,
        }
    }

    pub fn git_root(&self) -> &Path {
        &self.git_root
    }

    /// Enumerate worktrees via `git worktree list --porcelain`.
    pub async fn worktrees(&self) -> Result<Vec<WorktreeInfo>> {
        let output =
            run_git_checked(&["worktree", "list", "--porcelain"], &self.git_root).await?;
        Ok(parse_worktree_list(&output))
    }

    /// Enumerate worktrees, augmenting each with its short HEAD hash.
    pub async fn list(&self) -> Result<Vec<WorktreeListing>> {
        let mut listings = Vec::new();
        for info in self.worktrees().await? {
            let head = short_head(&info.path)
                .await
                .unwrap_or_else(|| "unknown".to_string());
            listings.push(WorktreeListing { info, head });
        }
        Ok(listings)
    }

    /// Locate a worktree by branch name, falling back to a path-suffix
    /// match.
    pub async fn find_by_branch(&self, branch: &str) -> Result<WorktreeInfo> {
        let worktrees = self.worktrees().await?;
        worktrees
            .into_iter()
            .find(|wt| wt.branch.as_deref() == Some(branch) || wt.path.ends_with(branch))
            .ok_or_else(|| OtError::UnknownWorktree(branch.to_string()).into())
    }

    /// Create a worktree for `branch` at `base_dir/branch` and run the
    /// post-create hooks inside it. Hook failures warn but never fail
    /// the add.
    pub async fn add(&self, branch: &str, opts: &AddOptions) -> Result<PathBuf> {
        let path = self.base_dir.join(branch);

        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir).with_context(|| {
                format!("creating worktree base dir {}", self.base_dir.display())
            })?;
        }

        if path.exists() && !opts.force {
            bail!(
                "worktree path already exists: {} (use --force to overwrite)",
                path.display()
            );
        }

        let path_str = path.to_string_lossy().into_owned();
        let mut args: Vec<&str> = vec!["worktree", "add"];
        if opts.force {
            args.push("--force");
        }
        if opts.new_branch {
            args.push("-b");
            args.push(branch);
            args.push(&path_str);
            if let Some(base) = &opts.base {
                args.push(base);
            }
        } else {
            args.push(&path_str);
            args.push(branch);
        }

        run_git_checked(&args, &self.git_root).await?;
        info!(branch = %branch, path = %path.display(), "created worktree");
        println!(
            "{} {} {}",
            "Created worktree".green(),
            branch.bold(),
            format!("at {}", path.display()).dimmed()
        );

        self.run_post_create_hooks(&path).await;

        Ok(path)
    }

    /// Remove the worktree for `branch`. Refuses to remove the main
    /// worktree. Optionally deletes the branch afterwards, warning on
    /// failure.
    pub async fn remove(&self, branch: &str, opts: &RemoveOptions) -> Result<()> {
        let target = self.find_by_branch(branch).await?;
        if target.is_main {
            bail!("refusing to remove the main worktree");
        }

        let path_str = target.path.to_string_lossy().into_owned();
        let mut args: Vec<&str> = vec!["worktree", "remove"];
        if opts.force {
            args.push("--force");
        }
        args.push(&path_str);

        run_git_checked(&args, &self.git_root).await?;
        println!("{} {}", "Removed worktree".green(), branch.bold());

        if opts.delete_branch {
            match run_git_checked(&["branch", "-D", branch], &self.git_root).await {
                Ok(_) => println!("{} {}", "Deleted branch".green(), branch.bold()),
                Err(err) => {
                    warn!(branch = %branch, error = %err, "failed to delete branch");
                    eprintln!(
                        "{}",
                        format!("warning: failed to delete branch {branch}: {err:#}").yellow()
                    );
                }
            }
        }

        Ok(())
    }

    /// Copy files between worktrees. Both arguments are `[BRANCH@]PATH`;
    /// an omitted branch means the current worktree. Globbed sources
    /// preserve their directory structure under the destination path.
    pub async fn copy(&self, src: &str, dest: &str, cwd: &Path) -> Result<()> {
        let (src_branch, src_path) = parse_copy_arg(src);
        let (dest_branch, dest_path) = parse_copy_arg(dest);

        let src_root = match src_branch {
            Some(branch) => self.find_by_branch(branch).await?.path,
            None => self.git_root.clone(),
        };
        let dest_root = match dest_branch {
            Some(branch) => self.find_by_branch(branch).await?.path,
            None => self.git_root.clone(),
        };

        let src_rel = user_rel_path(src_path, cwd, &self.git_root);
        let dest_rel = user_rel_path(dest_path, cwd, &self.git_root);

        let mut copied = 0usize;

        if fsutil::has_glob_chars(&src_rel.to_string_lossy()) {
            let pattern = src_root.join(&src_rel);
            let mut matches = Vec::new();
            for entry in glob::glob(&pattern.to_string_lossy())
                .with_context(|| format!("invalid glob pattern: {src_path}"))?
            {
                if let Ok(path) = entry {
                    matches.push(path);
                }
            }
            if matches.is_empty() {
                bail!("no files match '{src}'");
            }

            for matched in matches {
                let rel = matched
                    .strip_prefix(&src_root)
                    .unwrap_or(&matched)
                    .to_path_buf();
                let source = ensure_within(&src_root, &matched)?;
                let target = ensure_within(&dest_root, &dest_root.join(&dest_rel).join(&rel))?;
                debug!(from = %source.display(), to = %target.display(), "copying");
                copied += fsutil::copy_recursively(&source, &target).with_context(|| {
                    format!("copying {} to {}", source.display(), target.display())
                })?;
            }
        } else {
            let source = ensure_within(&src_root, &src_root.join(&src_rel))?;
            if !source.exists() {
                bail!("source path does not exist: {}", source.display());
            }
            let target = ensure_within(&dest_root, &dest_root.join(&dest_rel))?;
            debug!(from = %source.display(), to = %target.display(), "copying");
            copied += fsutil::copy_recursively(&source, &target).with_context(|| {
                format!("copying {} to {}", source.display(), target.display())
            })?;
        }

        println!("{}", format!("Copied {copied} file(s)").green());
        Ok(())
    }

    async fn run_post_create_hooks(&self, worktree_path: &Path) {
        for hook in &self.hooks {
            if let Err(err) = self.run_hook(hook, worktree_path).await {
                warn!(error = %err, "post-create hook failed");
                eprintln!(
                    "{}",
                    format!("warning: post-create hook failed: {err:#}").yellow()
                );
            }
        }
    }

    async fn run_hook(&self, hook: &Hook, worktree_path: &Path) -> Result<()> {
        match hook {
            Hook::Copy { from, to, .. } => {
                let src = self.git_root.join(from);
                let dest = ensure_within(worktree_path, &worktree_path.join(to))?;
                debug!(from = %src.display(), to = %dest.display(), "copy hook");
                fsutil::copy_recursively(&src, &dest)
                    .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
                Ok(())
            }
            Hook::Cmd { cmd } => {
                debug!(cmd = %cmd, "command hook");
                let status = shell_command(cmd)
                    .current_dir(worktree_path)
                    .status()
                    .await
                    .with_context(|| format!("spawning hook command '{cmd}'"))?;
                if !status.success() {
                    bail!(
                        "hook command '{cmd}' exited with {}",
                        status.code().unwrap_or(-1)
                    );
                }
                Ok(())
            }
        }
    }
}

/// Split a `[BRANCH@]PATH` copy argument.
pub fn parse_copy_arg(arg: &str) -> (Option<&str>, &str) {
    match arg.split_once('@') {
        Some((branch, path)) if !branch.is_empty() => (Some(branch), path),
        _ => (None, arg),
    }
}

/// Make a user-supplied relative path consistent regardless of the
/// subdirectory the command was invoked from: the cwd's offset from the
/// git root is prepended. Absolute paths pass through untouched.
pub fn user_rel_path(path: &str, cwd: &Path, git_root: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    match cwd.strip_prefix(git_root) {
        Ok(rel_cwd) => rel_cwd.join(p),
        Err(_) => p.to_path_buf(),
    }
}

/// Lexically normalize a path, resolving `.` and `..` components.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reject any candidate path that escapes `root` after normalization.
/// Nothing is written for rejected paths.
pub fn ensure_within(root: &Path, candidate: &Path) -> crate::errors::Result<PathBuf> {
    let normalized = lexical_normalize(candidate);
    if !normalized.starts_with(lexical_normalize(root)) {
        return Err(OtError::PathTraversal(
            candidate.display().to_string(),
        ));
    }
    Ok(normalized)
}
