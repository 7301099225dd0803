// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{Config, Workflow};
use crate::errors::{OtError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks, per workflow:
/// - step names are non-empty and unique
/// - every step carries exactly one action
/// - all `dependsOn` references resolve to sibling steps
/// - the step graph has no cycles
///
/// An empty workflow is allowed; running it does nothing and exits 0.
pub fn validate_config(cfg: &Config) -> Result<()> {
    for (name, workflow) in &cfg.workflows {
        validate_workflow(name, workflow)?;
    }
    Ok(())
}

fn validate_workflow(workflow_name: &str, workflow: &Workflow) -> Result<()> {
    let steps = workflow.steps();

    let mut seen = std::collections::HashSet::new();
    for step in steps {
        if step.name.is_empty() {
            return Err(OtError::Config(format!(
                "workflow '{workflow_name}' contains a step with an empty name"
            )));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(OtError::Config(format!(
                "workflow '{workflow_name}' has duplicate step '{}'",
                step.name
            )));
        }
        if step.action().is_none() {
            return Err(OtError::Config(format!(
                "step '{}' in workflow '{workflow_name}' must define exactly one action (cmd, worktree:cp, or bun)",
                step.name
            )));
        }
    }

    for step in steps {
        for dep in &step.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(OtError::Config(format!(
                    "step '{}' in workflow '{workflow_name}' has unknown dependency '{dep}' in `dependsOn`",
                    step.name
                )));
            }
            if dep == &step.name {
                return Err(OtError::Config(format!(
                    "step '{}' in workflow '{workflow_name}' cannot depend on itself",
                    step.name
                )));
            }
        }
    }

    validate_step_dag(workflow_name, workflow)
}

fn validate_step_dag(workflow_name: &str, workflow: &Workflow) -> Result<()> {
    // Edge direction: dep -> step.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for step in workflow.steps() {
        graph.add_node(step.name.as_str());
    }

    for step in workflow.steps() {
        for dep in &step.depends_on {
            graph.add_edge(dep.as_str(), step.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(OtError::Config(format!(
            "cycle detected in workflow '{workflow_name}' involving step '{}'",
            cycle.node_id()
        ))),
    }
}
