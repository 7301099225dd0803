// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::jsonc::strip_comments;
use crate::config::model::Config;
use crate::config::validate::validate_config;
use crate::errors::{OtError, Result};

/// File names probed at every level of the discovery walk, in order.
const CONFIG_FILENAMES: &[&str] = &[
    "workflow.json",
    "workflow.jsonc",
    "workflows.json",
    "workflows.jsonc",
];

/// Extra candidates probed under `.config/` at the git root only.
const ROOT_CONFIG_FILENAMES: &[&str] = &[
    "workflow.jsonc",
    "workflow.json",
    "workflows.jsonc",
    "workflows.json",
];

/// Load and validate the config, either from an explicit path or by
/// walking from `cwd` up to the git root.
///
/// Returns the config together with the path it was read from.
pub fn load_config(
    explicit: Option<&Path>,
    cwd: &Path,
    git_root: Option<&Path>,
) -> Result<(Config, PathBuf)> {
    if let Some(path) = explicit {
        let cfg = parse_config_file(path)?;
        validate_config(&cfg)?;
        return Ok((cfg, path.to_path_buf()));
    }

    match discover_config(cwd, git_root)? {
        Some((cfg, path)) => {
            validate_config(&cfg)?;
            Ok((cfg, path))
        }
        None => Err(OtError::Config(
            "no config file found (looked for workflow.json(c), workflows.json(c) \
             and package.json#workflows up to the git root)"
                .to_string(),
        )),
    }
}

/// Walk `cwd` and its ancestors, stopping after the git root.
fn discover_config(cwd: &Path, git_root: Option<&Path>) -> Result<Option<(Config, PathBuf)>> {
    for dir in cwd.ancestors() {
        for name in CONFIG_FILENAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = ?candidate, "found config file");
                return Ok(Some((parse_config_file(&candidate)?, candidate)));
            }
        }

        let package_json = dir.join("package.json");
        if package_json.is_file() {
            if let Some(cfg) = config_from_package_json(&package_json)? {
                debug!(path = ?package_json, "using workflows field from package.json");
                return Ok(Some((cfg, package_json)));
            }
        }

        let at_git_root = git_root.map(|root| root == dir).unwrap_or(false);
        if at_git_root {
            for name in ROOT_CONFIG_FILENAMES {
                let candidate = dir.join(".config").join(name);
                if candidate.is_file() {
                    debug!(path = ?candidate, "found config file under .config");
                    return Ok(Some((parse_config_file(&candidate)?, candidate)));
                }
            }
            break;
        }

        // Without a git root there is nothing to anchor the walk; only
        // the current directory is considered.
        if git_root.is_none() {
            break;
        }
    }

    Ok(None)
}

/// Parse a config file from disk, stripping JSONC comments first.
fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .map_err(|e| OtError::Config(format!("reading config file {}: {e}", path.display())))?;
    parse_config_str(&contents)
        .map_err(|e| OtError::Config(format!("parsing config from {}: {e}", path.display())))
}

/// Parse config from a JSON/JSONC string.
pub fn parse_config_str(contents: &str) -> Result<Config> {
    let stripped = strip_comments(contents);
    Ok(serde_json::from_str(&stripped)?)
}

/// Extract a config from a `package.json` carrying a `workflows` field.
fn config_from_package_json(path: &Path) -> Result<Option<Config>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| OtError::Config(format!("reading {}: {e}", path.display())))?;
    let value: serde_json::Value = serde_json::from_str(&strip_comments(&contents))
        .map_err(|e| OtError::Config(format!("parsing {}: {e}", path.display())))?;

    let Some(workflows) = value.get("workflows") else {
        return Ok(None);
    };

    let composed = serde_json::json!({
        "workflows": workflows,
        "worktree": value.get("worktree"),
    });

    let cfg: Config = serde_json::from_value(composed)
        .map_err(|e| OtError::Config(format!("parsing workflows from {}: {e}", path.display())))?;
    Ok(Some(cfg))
}
