// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a JSON/JSONC file.
///
/// ```jsonc
/// {
///   "workflows": {
///     "ci": [
///       { "name": "lint", "cmd": "bun lint" },
///       { "name": "test", "dependsOn": ["lint"], "bun": { "script": "test" } }
///     ]
///   },
///   "worktree": {
///     "defaults": { "base_dir": "../worktrees" },
///     "hooks": { "post_create": [{ "cmd": "bun install" }] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// All workflows, keyed by job name.
    #[serde(default)]
    pub workflows: BTreeMap<String, Workflow>,

    /// Worktree manager configuration.
    #[serde(default)]
    pub worktree: Option<WorktreeSection>,
}

/// A workflow is either a plain step array or a record with a `steps` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Workflow {
    Steps(Vec<Step>),
    Record { steps: Vec<Step> },
}

impl Workflow {
    pub fn steps(&self) -> &[Step] {
        match self {
            Workflow::Steps(steps) => steps,
            Workflow::Record { steps } => steps,
        }
    }
}

/// One unit of work inside a workflow.
///
/// The three action fields are mutually exclusive; `validate` rejects
/// configs where zero or more than one is present, and the scheduler
/// fails such a step immediately if one slips through anyway.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Names of sibling steps that must complete first.
    #[serde(default, rename = "dependsOn")]
    pub depends_on: Vec<String>,

    /// Branch-filter patterns deciding whether this step runs at all.
    #[serde(default)]
    pub branches: Option<Vec<String>>,

    /// Shell command action.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Copy-from-another-worktree action.
    #[serde(default, rename = "worktree:cp")]
    pub worktree_cp: Option<WorktreeCpAction>,

    /// Workspace-script action (per-package task fan-out).
    #[serde(default)]
    pub bun: Option<WorkspaceScriptAction>,
}

/// Borrowed view of a step's single action.
#[derive(Debug, Clone, Copy)]
pub enum StepAction<'a> {
    Cmd(&'a str),
    WorktreeCp(&'a WorktreeCpAction),
    Script(&'a WorkspaceScriptAction),
}

impl Step {
    /// The step's action, or `None` when zero or several are configured.
    pub fn action(&self) -> Option<StepAction<'_>> {
        match (&self.cmd, &self.worktree_cp, &self.bun) {
            (Some(cmd), None, None) => Some(StepAction::Cmd(cmd)),
            (None, Some(cp), None) => Some(StepAction::WorktreeCp(cp)),
            (None, None, Some(script)) => Some(StepAction::Script(script)),
            _ => None,
        }
    }
}

/// `worktree:cp` action: copy files from another worktree into this one.
#[derive(Debug, Clone, Deserialize)]
pub struct WorktreeCpAction {
    /// Source branch, optionally prefixed with `worktree:`.
    pub from: String,

    /// Glob patterns rooted at the source worktree.
    pub files: Vec<String>,

    /// Count unmatched patterns as skipped instead of failing the step.
    #[serde(default, rename = "allowMissing")]
    pub allow_missing: bool,
}

/// `bun` action: run a named script across all workspace packages that
/// define it, respecting TurboRepo-style dependency specs.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceScriptAction {
    pub script: String,

    /// Per-task timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// `^NAME`, `PKG#NAME`, or bare `NAME` (a no-op at this level).
    #[serde(default, rename = "dependsOn")]
    pub depends_on: Vec<String>,
}

/// `worktree` config section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorktreeSection {
    #[serde(default)]
    pub defaults: WorktreeDefaults,

    #[serde(default)]
    pub hooks: WorktreeHooks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorktreeDefaults {
    /// Directory for new worktrees, relative to the git root.
    #[serde(default)]
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorktreeHooks {
    /// Hooks executed inside a freshly created worktree.
    #[serde(default)]
    pub post_create: Vec<Hook>,
}

/// A post-create hook: either a file copy from the main worktree or a
/// shell command run inside the new worktree.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Hook {
    Copy {
        #[serde(rename = "type")]
        kind: HookCopyKind,
        from: String,
        to: String,
    },
    Cmd {
        cmd: String,
    },
}

/// Discriminator for the copy hook form (`"type": "copy"`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookCopyKind {
    Copy,
}
