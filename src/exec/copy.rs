// src/exec/copy.rs

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::ActionResult;
use crate::config::model::WorktreeCpAction;
use crate::fsutil;
use crate::worktree::manager::ensure_within;
use crate::worktree::WorktreeManager;

/// Copy files from another worktree into the current git root.
///
/// Unmatched patterns fail the step unless `allowMissing` is set, in
/// which case they are counted as skipped.
pub async fn run_worktree_cp(
    action: &WorktreeCpAction,
    manager: &WorktreeManager,
    _verbose: bool,
) -> ActionResult {
    let started = Instant::now();
    match copy_inner(action, manager).await {
        Ok(output) => ActionResult {
            success: true,
            output,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Err(err) => ActionResult::failure(
            format!("{err:#}"),
            started.elapsed().as_millis() as u64,
        ),
    }
}

async fn copy_inner(action: &WorktreeCpAction, manager: &WorktreeManager) -> Result<String> {
    let source_branch = action
        .from
        .strip_prefix("worktree:")
        .unwrap_or(&action.from);

    let source = manager.find_by_branch(source_branch).await?;
    let dest_root = manager.git_root();

    let mut copied = 0usize;
    let mut skipped = 0usize;

    for pattern in &action.files {
        let matches = expand_pattern(&source.path, pattern)?;

        if matches.is_empty() {
            if action.allow_missing {
                debug!(pattern = %pattern, "no matches; skipping (allowMissing)");
                skipped += 1;
                continue;
            }
            bail!("no files match pattern '{pattern}' in worktree '{source_branch}'");
        }

        for matched in matches {
            let rel = matched
                .strip_prefix(&source.path)
                .unwrap_or(&matched)
                .to_path_buf();
            let dest = ensure_within(dest_root, &dest_root.join(&rel))?;
            debug!(from = %matched.display(), to = %dest.display(), "copying");
            copied += fsutil::copy_recursively(&matched, &dest).with_context(|| {
                format!("copying {} to {}", matched.display(), dest.display())
            })?;
        }
    }

    let mut summary = format!("Copied {copied} file(s) from '{source_branch}'");
    if skipped > 0 {
        summary.push_str(&format!(", {skipped} pattern(s) skipped"));
    }
    Ok(summary)
}

/// Expand a pattern relative to the source worktree root. Non-glob
/// patterns resolve to the single path when it exists.
fn expand_pattern(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if fsutil::has_glob_chars(pattern) {
        let full = root.join(pattern);
        let mut out = Vec::new();
        for entry in glob::glob(&full.to_string_lossy())
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
        {
            if let Ok(path) = entry {
                out.push(path);
            }
        }
        Ok(out)
    } else {
        let path = root.join(pattern);
        if path.exists() {
            Ok(vec![path])
        } else {
            Ok(Vec::new())
        }
    }
}
