//! Planner output types.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use stackpack_core::{Direction, ForwardRef, ResourceId};

use crate::diagnostics::Diagnostic;
use crate::graph::DependencyGraph;
use crate::packer::{Fragment, Weighted};

/// A named deployment unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container<M> {
    pub name: String,
    /// Grouping container this one was split out of, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub members: Vec<M>,
    /// Summed member cost.
    pub cost: u32,
    /// Context inherited from the allocation, e.g. a shared network id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub shared: BTreeMap<String, String>,
    pub depends_on: BTreeSet<String>,
}

/// One placed item (or fragment) inside a container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member<R> {
    /// Unique within the plan; fragments get a `/part{n}` suffix.
    pub name: String,
    pub cost: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<Fragment>,
    pub record: R,
}

/// A base resource as it lands in a phase-1 container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub payload: serde_json::Value,
    /// References to the resource itself, synthesized inline.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_refs: Vec<ForwardRef>,
}

/// A cross-resource reference materialized in phase 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEdge {
    /// `{owner}/{direction}-{ref index}`; unique because owner ids are and
    /// never contain `/`.
    pub name: String,
    /// The descriptor that declared the reference.
    pub owner: ResourceId,
    pub source: ResourceId,
    pub target: ResourceId,
    pub direction: Direction,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub cost: u32,
    pub source_container: String,
    pub target_container: String,
}

impl Weighted for ReferenceEdge {
    fn cost(&self) -> u32 {
        self.cost
    }
}

pub type ResourceContainer = Container<Member<ResourceRecord>>;
pub type EdgeContainer = Container<Member<ReferenceEdge>>;

/// The complete output of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub namespace: String,
    pub phase1: Vec<ResourceContainer>,
    pub phase2: Vec<EdgeContainer>,
    pub dependencies: DependencyGraph,
    pub diagnostics: Vec<Diagnostic>,
}

impl Plan {
    pub fn phase1_names(&self) -> BTreeSet<String> {
        self.phase1.iter().map(|c| c.name.clone()).collect()
    }

    pub fn phase2_names(&self) -> BTreeSet<String> {
        self.phase2.iter().map(|c| c.name.clone()).collect()
    }

    pub fn container_count(&self) -> usize {
        self.phase1.len() + self.phase2.len()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Container holding `id`, or its first fragment.
    pub fn locate(&self, id: &str) -> Option<&str> {
        self.phase1
            .iter()
            .find(|c| c.members.iter().any(|m| m.record.id.as_str() == id))
            .map(|c| c.name.as_str())
    }

    pub fn edges(&self) -> impl Iterator<Item = &ReferenceEdge> {
        self.phase2
            .iter()
            .flat_map(|c| c.members.iter().map(|m| &m.record))
    }

    pub fn is_empty(&self) -> bool {
        self.phase1.is_empty() && self.phase2.is_empty()
    }
}
