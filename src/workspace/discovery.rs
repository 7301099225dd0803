// src/workspace/discovery.rs

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

/// A manifest as read from a `package.json` file.
#[derive(Debug, Clone, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    workspaces: Option<WorkspacesField>,

    #[serde(default)]
    scripts: BTreeMap<String, String>,

    #[serde(default)]
    dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "optionalDependencies")]
    optional_dependencies: BTreeMap<String, String>,
}

/// The `workspaces` field is either a plain pattern array or an object
/// with a `packages` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Patterns(Vec<String>),
    Object { packages: Vec<String> },
}

impl WorkspacesField {
    fn patterns(&self) -> &[String] {
        match self {
            WorkspacesField::Patterns(p) => p,
            WorkspacesField::Object { packages } => packages,
        }
    }
}

/// A discovered workspace member.
#[derive(Debug, Clone)]
pub struct WorkspacePackage {
    pub name: String,
    pub path: PathBuf,
    pub scripts: BTreeMap<String, String>,
    /// Dependency names that are themselves workspace members.
    pub workspace_deps: Vec<String>,
}

/// Discover all workspace packages under `root`.
///
/// A missing or workspace-less root manifest is an error; a matched
/// directory whose manifest is unreadable or unnamed is silently skipped.
/// Output is sorted by package name.
pub fn discover_workspaces(root: &Path) -> Result<Vec<WorkspacePackage>> {
    let root_manifest_path = root.join("package.json");
    let root_manifest = read_manifest(&root_manifest_path).with_context(|| {
        format!(
            "reading workspace root manifest at {}",
            root_manifest_path.display()
        )
    })?;

    let patterns = match &root_manifest.workspaces {
        Some(field) => field.patterns().to_vec(),
        None => bail!(
            "no `workspaces` field in {}",
            root_manifest_path.display()
        ),
    };

    // First pass: register name -> (path, manifest).
    let mut registered: BTreeMap<String, (PathBuf, PackageManifest)> = BTreeMap::new();
    for pattern in &patterns {
        let full = root.join(pattern);
        let entries = glob::glob(&full.to_string_lossy())
            .with_context(|| format!("invalid workspace pattern: {pattern}"))?;

        for entry in entries {
            let dir = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable glob entry");
                    continue;
                }
            };
            if !dir.is_dir() {
                continue;
            }
            let manifest_path = dir.join("package.json");
            if !manifest_path.is_file() {
                continue;
            }
            match read_manifest(&manifest_path) {
                Ok(manifest) => {
                    if let Some(name) = manifest.name.clone() {
                        debug!(package = %name, path = ?dir, "registered workspace package");
                        registered.insert(name, (dir, manifest));
                    }
                }
                Err(err) => {
                    debug!(
                        path = ?manifest_path,
                        error = %err,
                        "skipping unreadable package manifest"
                    );
                }
            }
        }
    }

    // Second pass: resolve in-workspace dependencies.
    let known: HashSet<String> = registered.keys().cloned().collect();
    let mut packages = Vec::with_capacity(registered.len());

    for (name, (path, manifest)) in &registered {
        let mut deps: Vec<String> = manifest
            .dependencies
            .keys()
            .chain(manifest.dev_dependencies.keys())
            .chain(manifest.optional_dependencies.keys())
            .filter(|dep| known.contains(*dep) && *dep != name)
            .cloned()
            .collect();
        deps.sort();
        deps.dedup();

        packages.push(WorkspacePackage {
            name: name.clone(),
            path: path.clone(),
            scripts: manifest.scripts.clone(),
            workspace_deps: deps,
        });
    }

    Ok(packages)
}

fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
