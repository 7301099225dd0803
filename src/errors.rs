// src/errors.rs

//! Crate-wide error types.
//!
//! Most code propagates `anyhow::Error` with context; the variants here
//! exist for the errors whose exact wording is observable (CLI output,
//! tests) or which callers match on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Step \"{0}\" not found")]
    StepNotFound(String),

    #[error("Cycle involving \"{0}\"")]
    StepCycle(String),

    #[error("Circular dependency detected among tasks: {0}")]
    TaskCycle(String),

    #[error("Unknown worktree: {0}")]
    UnknownWorktree(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OtError>;
