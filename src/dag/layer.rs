// src/dag/layer.rs

use std::collections::HashSet;

use crate::errors::{OtError, Result};

/// Anything with an identity and a list of dependency IDs can be layered.
///
/// The step scheduler and the workspace task runner use different node
/// types; both implement this trait instead of duplicating the layering.
pub trait Layered {
    fn id(&self) -> String;
    fn deps(&self) -> Vec<String>;
}

/// Partition nodes into ordered layers of mutually-independent nodes.
///
/// - Edges pointing outside the input set are ignored.
/// - Within a layer, nodes keep their input order.
/// - Returns a cycle error enumerating the remaining nodes when a round
///   would emit an empty layer while work remains.
pub fn layer<T: Layered>(nodes: &[T]) -> Result<Vec<Vec<&T>>> {
    let ids: HashSet<String> = nodes.iter().map(|n| n.id()).collect();

    let mut remaining: Vec<&T> = nodes.iter().collect();
    let mut done: HashSet<String> = HashSet::new();
    let mut layers: Vec<Vec<&T>> = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&T>, Vec<&T>) = remaining.into_iter().partition(|n| {
            n.deps()
                .iter()
                .all(|d| !ids.contains(d.as_str()) || done.contains(d.as_str()))
        });

        if ready.is_empty() {
            let stuck = blocked
                .iter()
                .map(|n| n.id())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(OtError::TaskCycle(stuck));
        }

        done.extend(ready.iter().map(|n| n.id()));
        layers.push(ready);
        remaining = blocked;
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node {
        id: &'static str,
        deps: Vec<&'static str>,
    }

    impl Layered for Node {
        fn id(&self) -> String {
            self.id.to_string()
        }
        fn deps(&self) -> Vec<String> {
            self.deps.iter().map(|d| d.to_string()).collect()
        }
    }

    fn node(id: &'static str, deps: &[&'static str]) -> Node {
        Node {
            id,
            deps: deps.to_vec(),
        }
    }

    #[test]
    fn independent_nodes_form_one_layer() {
        let nodes = vec![node("a", &[]), node("b", &[]), node("c", &[])];
        let layers = layer(&nodes).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].len(), 3);
    }

    #[test]
    fn chain_layers_in_order() {
        let nodes = vec![node("c", &["b"]), node("b", &["a"]), node("a", &[])];
        let layers = layer(&nodes).unwrap();
        let ids: Vec<Vec<String>> = layers
            .iter()
            .map(|l| l.iter().map(|n| n.id()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn edges_outside_the_set_are_ignored() {
        let nodes = vec![node("a", &["phantom"]), node("b", &["a"])];
        let layers = layer(&nodes).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0][0].id(), "a");
    }

    #[test]
    fn cycle_reports_remaining_nodes() {
        let nodes = vec![node("a", &["b"]), node("b", &["a"])];
        let err = layer(&nodes).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Circular dependency"), "got: {msg}");
        assert!(msg.contains('a') && msg.contains('b'), "got: {msg}");
    }
}
