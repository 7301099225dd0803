// src/render/progress.rs

//! Differential TTY renderer for nested step/subtask trees.
//!
//! Each update rebuilds the full line list and rewrites the frame in
//! place: move the cursor up by the previous line count, clear and
//! rewrite every line, and blank any trailing lines when the frame
//! shrank. On a non-TTY the initial frame is printed once and updates
//! are suppressed.

use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};

use colored::Colorize;
use crossterm::{cursor, terminal, QueueableCommand};

use crate::engine::StepStatus;

/// One nested task line under a step.
#[derive(Debug, Clone)]
struct NestedTask {
    id: String,
    status: StepStatus,
    duration_ms: Option<u64>,
}

#[derive(Debug, Clone)]
struct StepLine {
    name: String,
    status: StepStatus,
    duration_ms: Option<u64>,
    nested: Vec<NestedTask>,
    show_nested: bool,
}

pub struct ProgressRenderer {
    steps: Vec<StepLine>,
    index: HashMap<String, usize>,
    last_line_count: usize,
    rendered_once: bool,
    is_tty: bool,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::with_tty(io::stdout().is_terminal())
    }

    /// Build a renderer with an explicit TTY flag; tests use `false`.
    pub fn with_tty(is_tty: bool) -> Self {
        Self {
            steps: Vec::new(),
            index: HashMap::new(),
            last_line_count: 0,
            rendered_once: false,
            is_tty,
        }
    }

    /// Register a step line in display order.
    pub fn add_step(&mut self, name: &str, status: StepStatus) {
        self.index.insert(name.to_string(), self.steps.len());
        self.steps.push(StepLine {
            name: name.to_string(),
            status,
            duration_ms: None,
            nested: Vec::new(),
            show_nested: false,
        });
    }

    /// Apply a status/duration patch to a step and redraw. Reaching a
    /// terminal state collapses the step's nested frame.
    pub fn update_step(&mut self, name: &str, status: StepStatus, duration_ms: Option<u64>) {
        if let Some(&i) = self.index.get(name) {
            let line = &mut self.steps[i];
            line.status = status;
            if duration_ms.is_some() {
                line.duration_ms = duration_ms;
            }
            if matches!(status, StepStatus::Done | StepStatus::Failed) {
                line.show_nested = false;
            }
        }
        self.render();
    }

    /// Register nested tasks under a step (all pending) and expand it.
    pub fn register_nested(&mut self, step: &str, tasks: &[String]) {
        if let Some(&i) = self.index.get(step) {
            let line = &mut self.steps[i];
            line.nested = tasks
                .iter()
                .map(|id| NestedTask {
                    id: id.clone(),
                    status: StepStatus::Pending,
                    duration_ms: None,
                })
                .collect();
            line.show_nested = true;
        }
        self.render();
    }

    /// Update one nested task and redraw.
    pub fn update_nested(
        &mut self,
        step: &str,
        task: &str,
        status: StepStatus,
        duration_ms: Option<u64>,
    ) {
        if let Some(&i) = self.index.get(step) {
            if let Some(nested) = self.steps[i].nested.iter_mut().find(|t| t.id == task) {
                nested.status = status;
                if duration_ms.is_some() {
                    nested.duration_ms = duration_ms;
                }
            }
        }
        self.render();
    }

    /// The current frame as plain lines (also used by tests).
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for step in &self.steps {
            out.push(format!(
                "{} {:<16} {}",
                status_icon(step.status),
                step.name,
                status_text(step.status, step.duration_ms)
            ));
            if step.show_nested {
                for task in &step.nested {
                    out.push(format!(
                        "  {} {:<24} {}",
                        status_icon(task.status),
                        task.id,
                        status_text(task.status, task.duration_ms)
                    ));
                }
            }
        }
        out
    }

    /// Redraw the frame.
    pub fn render(&mut self) {
        let lines = self.lines();
        let mut out = io::stdout();

        if !self.rendered_once {
            for line in &lines {
                let _ = writeln!(out, "{line}");
            }
            if self.is_tty {
                let _ = out.queue(cursor::Hide);
            }
            let _ = out.flush();
            self.rendered_once = true;
            self.last_line_count = lines.len();
            return;
        }

        if !self.is_tty {
            return;
        }

        if self.last_line_count > 0 {
            let _ = out.queue(cursor::MoveUp(self.last_line_count as u16));
        }
        for line in &lines {
            let _ = out.queue(terminal::Clear(terminal::ClearType::CurrentLine));
            let _ = writeln!(out, "{line}");
        }
        if lines.len() < self.last_line_count {
            let extra = self.last_line_count - lines.len();
            for _ in 0..extra {
                let _ = out.queue(terminal::Clear(terminal::ClearType::CurrentLine));
                let _ = writeln!(out);
            }
            let _ = out.queue(cursor::MoveUp(extra as u16));
        }
        let _ = out.flush();
        self.last_line_count = lines.len();
    }

    /// Always restore the cursor, whatever happened mid-run.
    pub fn cleanup(&mut self) {
        if self.is_tty {
            let mut out = io::stdout();
            let _ = out.queue(cursor::Show);
            let _ = out.flush();
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn status_icon(status: StepStatus) -> String {
    match status {
        StepStatus::Pending => "○".dimmed().to_string(),
        StepStatus::Running => "◐".yellow().to_string(),
        StepStatus::Done => "✓".green().to_string(),
        StepStatus::Failed => "✗".red().to_string(),
        StepStatus::Skipped => "○".dimmed().to_string(),
    }
}

fn status_text(status: StepStatus, duration_ms: Option<u64>) -> String {
    match status {
        StepStatus::Pending => String::new(),
        StepStatus::Running => "running".yellow().to_string(),
        StepStatus::Done => duration_ms.map(format_duration).unwrap_or_default(),
        StepStatus::Failed => match duration_ms {
            Some(ms) => format!("{} {}", "failed".red(), format_duration(ms)),
            None => "failed".red().to_string(),
        },
        StepStatus::Skipped => "skipped".dimmed().to_string(),
    }
}

/// `<1000ms` renders as milliseconds, otherwise as fractional seconds.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}
