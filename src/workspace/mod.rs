// src/workspace/mod.rs

//! Package-manager-style workspace support: discover member packages
//! from the root manifest's `workspaces` globs and derive per-package
//! task nodes for a named script.

pub mod discovery;
pub mod tasks;

pub use discovery::{discover_workspaces, WorkspacePackage};
pub use tasks::{build_task_nodes, TaskNode};
