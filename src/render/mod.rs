// src/render/mod.rs

//! Live progress rendering for workflow runs.

pub mod progress;

pub use progress::{format_duration, ProgressRenderer};
