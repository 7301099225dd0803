// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use super::{shell_command, ActionResult};

/// Run a command string through the shell, capturing combined
/// stdout/stderr. Non-zero exit means failure. In verbose mode the
/// captured lines are echoed as they arrive.
pub async fn run_cmd(cmd: &str, cwd: &Path, verbose: bool) -> ActionResult {
    let started = Instant::now();
    match run_cmd_inner(cmd, cwd, verbose).await {
        Ok((success, output)) => ActionResult {
            success,
            output,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Err(err) => ActionResult::failure(
            format!("{err:#}"),
            started.elapsed().as_millis() as u64,
        ),
    }
}

async fn run_cmd_inner(cmd: &str, cwd: &Path, verbose: bool) -> Result<(bool, String)> {
    debug!(cmd = %cmd, cwd = ?cwd, "starting command process");

    let mut command = shell_command(cmd);
    command
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for command '{cmd}'"))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let out_task = tokio::spawn(capture_lines(stdout, verbose));
    let err_task = tokio::spawn(capture_lines(stderr, verbose));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of command '{cmd}'"))?;

    let mut output = out_task.await.unwrap_or_default();
    output.push_str(&err_task.await.unwrap_or_default());

    debug!(
        cmd = %cmd,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "command process exited"
    );

    Ok((status.success(), output))
}

/// Drain a child stream line by line, optionally echoing to stdout.
async fn capture_lines<R>(reader: Option<R>, verbose: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return String::new();
    };

    let mut lines = BufReader::new(reader).lines();
    let mut buf = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if verbose && !line.is_empty() {
            println!("{line}");
        }
        buf.push_str(&line);
        buf.push('\n');
    }
    buf
}
