// src/config/mod.rs

//! Configuration loading and validation for ot.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Strip JSONC comments (`jsonc.rs`).
//! - Discover and load a config file from disk (`loader.rs`).
//! - Validate basic invariants like step-DAG correctness (`validate.rs`).

pub mod jsonc;
pub mod loader;
pub mod model;
pub mod schema;
pub mod validate;

pub use loader::{load_config, parse_config_str};
pub use model::{
    Config, Hook, Step, StepAction, Workflow, WorkspaceScriptAction, WorktreeCpAction,
    WorktreeSection,
};
pub use validate::validate_config;
