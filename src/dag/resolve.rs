// src/dag/resolve.rs

use std::collections::HashSet;

use crate::config::model::Step;
use crate::errors::{OtError, Result};

/// Resolve the requested step names to a closed set including all
/// transitive dependencies.
///
/// The result preserves the declaration order of `all`, so the output is
/// stable no matter how the requested names are ordered or repeated.
pub fn resolve_steps<'a>(all: &'a [Step], requested: &[String]) -> Result<Vec<&'a Step>> {
    let mut collected: HashSet<&'a str> = HashSet::new();
    let mut visiting: HashSet<&'a str> = HashSet::new();

    for name in requested {
        visit(all, name, &mut collected, &mut visiting)?;
    }

    Ok(all
        .iter()
        .filter(|step| collected.contains(step.name.as_str()))
        .collect())
}

fn visit<'a>(
    all: &'a [Step],
    name: &str,
    collected: &mut HashSet<&'a str>,
    visiting: &mut HashSet<&'a str>,
) -> Result<()> {
    let step = all
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| OtError::StepNotFound(name.to_string()))?;

    if collected.contains(step.name.as_str()) {
        return Ok(());
    }
    if !visiting.insert(step.name.as_str()) {
        return Err(OtError::StepCycle(step.name.clone()));
    }

    for dep in &step.depends_on {
        visit(all, dep, collected, visiting)?;
    }

    visiting.remove(step.name.as_str());
    collected.insert(step.name.as_str());
    Ok(())
}
