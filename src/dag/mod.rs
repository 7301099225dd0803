// src/dag/mod.rs

//! DAG algorithms shared by the step scheduler and the workspace task
//! runner: topological layering and step-set resolution.

pub mod layer;
pub mod resolve;

pub use layer::{layer, Layered};
pub use resolve::resolve_steps;

impl Layered for crate::config::model::Step {
    fn id(&self) -> String {
        self.name.clone()
    }
    fn deps(&self) -> Vec<String> {
        self.depends_on.clone()
    }
}
