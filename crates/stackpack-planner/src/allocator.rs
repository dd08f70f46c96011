//! Container allocator — turns packed batches into named containers.
//!
//! A single batch attaches straight to the caller's parent container.
//! Several batches each get a child container named
//! `{namespace}-{base}-{ordinal}`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use stackpack_core::{NAME_SEPARATOR, ResourceDescriptor};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::packer::{Batch, Weighted};
use crate::plan::{Container, Member, ResourceRecord};

/// An item the allocator can place.
pub trait Allocatable: Weighted {
    type Record;

    /// Stable key used for member names and the location map.
    fn key(&self) -> String;

    fn record(&self) -> Self::Record;
}

impl Allocatable for ResourceDescriptor {
    type Record = ResourceRecord;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn record(&self) -> ResourceRecord {
        ResourceRecord {
            id: self.id.clone(),
            payload: self.payload.clone(),
            inline_refs: Vec::new(),
        }
    }
}

/// Where an allocation lands and what its containers inherit.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationContext {
    pub namespace: String,
    /// Stem for generated child names, e.g. `phase1`.
    pub base: String,
    /// Name of the caller's container; single batches attach here.
    pub parent: String,
    pub shared: BTreeMap<String, String>,
}

impl AllocationContext {
    pub fn new(namespace: impl Into<String>, base: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            base: base.into(),
            parent: parent.into(),
            shared: BTreeMap::new(),
        }
    }

    pub fn with_shared(mut self, shared: BTreeMap<String, String>) -> Self {
        self.shared = shared;
        self
    }

    pub fn child_name(&self, ordinal: usize) -> String {
        format!("{}-{}-{}", self.namespace, self.base, ordinal)
    }
}

/// Result of one allocation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<R> {
    /// Set only when everything fit in one batch.
    pub parent: Option<Container<Member<R>>>,
    pub children: Vec<Container<Member<R>>>,
    /// Item key → container name. Split items map to their first fragment.
    pub locations: HashMap<String, String>,
}

impl<R> Allocation<R> {
    fn empty() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            locations: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.children.is_empty()
    }

    pub fn location(&self, key: &str) -> Option<&str> {
        self.locations.get(key).map(String::as_str)
    }

    pub fn container_names(&self) -> BTreeSet<String> {
        self.parent
            .iter()
            .chain(&self.children)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Every deployable container, parent first.
    pub fn into_containers(self) -> Vec<Container<Member<R>>> {
        self.parent.into_iter().chain(self.children).collect()
    }
}

/// Map batches onto containers, recording where each item went.
pub fn allocate<T: Allocatable>(
    batches: &[Batch<'_, T>],
    ctx: &AllocationContext,
    diag: &mut Diagnostics<'_>,
) -> Allocation<T::Record> {
    let mut allocation = Allocation::empty();

    match batches {
        [] => return allocation,
        [only] => {
            let container = build_container(only, ctx.parent.clone(), None, ctx, &mut allocation.locations);
            diag.info(
                DiagnosticKind::Allocation,
                format!(
                    "{}: {} members attached to parent container '{}'",
                    ctx.base,
                    container.members.len(),
                    ctx.parent
                ),
            );
            allocation.parent = Some(container);
        }
        _ => {
            for (ordinal, batch) in batches.iter().enumerate() {
                let container = build_container(
                    batch,
                    ctx.child_name(ordinal),
                    Some(ctx.parent.clone()),
                    ctx,
                    &mut allocation.locations,
                );
                allocation.children.push(container);
            }
            diag.info(
                DiagnosticKind::Allocation,
                format!(
                    "{}: created {} child containers under '{}'",
                    ctx.base,
                    allocation.children.len(),
                    ctx.parent
                ),
            );
        }
    }

    allocation
}

fn build_container<T: Allocatable>(
    batch: &Batch<'_, T>,
    name: String,
    parent: Option<String>,
    ctx: &AllocationContext,
    locations: &mut HashMap<String, String>,
) -> Container<Member<T::Record>> {
    let members = batch
        .entries
        .iter()
        .map(|entry| {
            let key = entry.item.key();
            locations.entry(key.clone()).or_insert_with(|| name.clone());
            let name = match batch.fragment {
                Some(f) => format!("{key}{NAME_SEPARATOR}part{}", f.part_index),
                None => key,
            };
            Member {
                name,
                cost: entry.cost,
                fragment: batch.fragment,
                record: entry.item.record(),
            }
        })
        .collect();

    Container {
        name,
        parent,
        members,
        cost: batch.total_cost,
        shared: ctx.shared.clone(),
        depends_on: BTreeSet::new(),
    }
}
