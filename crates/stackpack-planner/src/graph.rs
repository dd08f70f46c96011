//! Container dependency graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::plan::Container;

/// Container name → names it must be deployed after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>) {
        self.edges.entry(name.into()).or_default();
    }

    /// Record that `from` depends on `on`. Both become nodes.
    pub fn add_dependency(&mut self, from: impl Into<String>, on: impl Into<String>) {
        let on = on.into();
        self.add_node(on.clone());
        self.edges.entry(from.into()).or_default().insert(on);
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Deployment order, dependencies first. Ties break by name.
    /// Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .edges
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.len()))
            .collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, deps) in &self.edges {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(next) = ready.pop_first() {
            order.push(next.to_string());
            for dependent in dependents.get(next).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        (order.len() == self.edges.len()).then_some(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }
}

/// Make every phase-2 container depend on every phase-1 container and
/// return the resulting graph.
///
/// This is a superset of the true per-edge dependencies: no phase-2
/// container can be deployed before a target it might reference exists.
pub fn wire_phases<A, B>(phase1: &[Container<A>], phase2: &mut [Container<B>]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let phase1_names: BTreeSet<String> = phase1.iter().map(|c| c.name.clone()).collect();

    for name in &phase1_names {
        graph.add_node(name.clone());
    }
    for container in phase2.iter_mut() {
        container.depends_on.extend(phase1_names.iter().cloned());
        graph.add_node(container.name.clone());
        for dep in &container.depends_on {
            graph.add_dependency(container.name.clone(), dep.clone());
        }
    }

    graph
}
