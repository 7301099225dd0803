// src/workspace/tasks.rs

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::dag::layer::Layered;
use crate::workspace::discovery::WorkspacePackage;

/// One `(package, script)` pair, the unit executed by the
/// workspace-script action. Task IDs are `PKG#SCRIPT`.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub package_name: String,
    pub package_path: PathBuf,
    pub script: String,
    pub dependencies: Vec<String>,
}

impl TaskNode {
    pub fn id(&self) -> String {
        format!("{}#{}", self.package_name, self.script)
    }
}

impl Layered for TaskNode {
    fn id(&self) -> String {
        TaskNode::id(self)
    }
    fn deps(&self) -> Vec<String> {
        self.dependencies.clone()
    }
}

/// Build per-package task nodes for `script` across all candidate
/// packages, applying the dependency spec:
///
/// - `^NAME`  — same script in all workspace dependencies first
/// - `PKG#NAME` — that specific task first (iff PKG exists and has NAME)
/// - `NAME` — same-package-task form; a no-op at this level
///
/// Only immediate edges are emitted; the layerer closes over the set.
pub fn build_task_nodes(
    script: &str,
    depends_on: &[String],
    packages: &[WorkspacePackage],
) -> Vec<TaskNode> {
    let candidates: Vec<&WorkspacePackage> = packages
        .iter()
        .filter(|p| p.scripts.contains_key(script))
        .collect();
    let has_script: HashSet<&str> = candidates.iter().map(|p| p.name.as_str()).collect();

    let has_caret = depends_on.iter().any(|d| d.starts_with('^'));
    let specific: Vec<(&str, &str)> = depends_on
        .iter()
        .filter_map(|d| d.split_once('#'))
        .collect();

    let by_name: BTreeMap<&str, &WorkspacePackage> =
        packages.iter().map(|p| (p.name.as_str(), p)).collect();

    candidates
        .iter()
        .map(|pkg| {
            let mut deps: Vec<String> = Vec::new();

            if has_caret {
                for dep in &pkg.workspace_deps {
                    if has_script.contains(dep.as_str()) {
                        deps.push(format!("{dep}#{script}"));
                    }
                }
            }

            for (dep_pkg, dep_script) in &specific {
                if let Some(target) = by_name.get(dep_pkg) {
                    if target.scripts.contains_key(*dep_script) {
                        deps.push(format!("{dep_pkg}#{dep_script}"));
                    }
                }
            }

            deps.sort();
            deps.dedup();

            TaskNode {
                package_name: pkg.name.clone(),
                package_path: pkg.path.clone(),
                script: script.to_string(),
                dependencies: deps,
            }
        })
        .collect()
}
