// src/exec/mod.rs

//! Step action executors. Each executor measures wall time and converts
//! internal errors into a failed [`ActionResult`] instead of propagating.

pub mod command;
pub mod copy;
pub mod script;

use tokio::process::Command;

/// Outcome of a single step action.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    pub output: String,
    pub duration_ms: u64,
}

impl ActionResult {
    pub fn failure(output: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            output,
            duration_ms,
        }
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
