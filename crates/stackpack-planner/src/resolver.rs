//! Two-phase reference resolver.
//!
//! Phase 1 packs the base descriptors into containers. References between
//! descriptors are then lifted out as [`ReferenceEdge`]s, packed with a
//! separate capacity, and placed in phase-2 containers that depend on
//! every phase-1 container.
//!
//! Reference problems never abort the run. A descriptor whose references
//! are all invalid is excluded; otherwise only the invalid references are
//! dropped. Each dropped reference produces exactly one warning.

use stackpack_core::{
    Capacity, ForwardRef, NAME_SEPARATOR, ResourceDescriptor, ResourceId, ResourceIndex, Settings,
};
use tracing::debug;

use crate::allocator::{Allocatable, Allocation, AllocationContext, allocate};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Diagnostics};
use crate::error::{PlanError, PlanResult};
use crate::graph::wire_phases;
use crate::packer::{Batch, Weighted, pack, summarize};
use crate::plan::{Plan, ReferenceEdge, ResourceRecord};

/// Stem for phase-1 child container names.
pub const PHASE1_BASE: &str = "phase1";
/// Stem for phase-2 child container names.
pub const PHASE2_BASE: &str = "phase2";

/// A reference to a different, existing descriptor.
#[derive(Debug)]
struct CrossRef<'a> {
    /// Position in the owner's `forward_refs`.
    index: usize,
    reference: &'a ForwardRef,
    target: ResourceId,
}

/// A descriptor admitted to phase 1.
#[derive(Debug)]
struct BaseResource<'a> {
    descriptor: &'a ResourceDescriptor,
    inline_refs: Vec<ForwardRef>,
    cross_refs: Vec<CrossRef<'a>>,
}

impl Weighted for BaseResource<'_> {
    fn cost(&self) -> u32 {
        self.descriptor.cost
    }
}

impl Allocatable for BaseResource<'_> {
    type Record = ResourceRecord;

    fn key(&self) -> String {
        self.descriptor.id.to_string()
    }

    fn record(&self) -> ResourceRecord {
        ResourceRecord {
            id: self.descriptor.id.clone(),
            payload: self.descriptor.payload.clone(),
            inline_refs: self.inline_refs.clone(),
        }
    }
}

impl Allocatable for ReferenceEdge {
    type Record = ReferenceEdge;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn record(&self) -> ReferenceEdge {
        self.clone()
    }
}

/// Plans descriptors into phase-1 and phase-2 containers.
#[derive(Debug, Clone)]
pub struct Resolver {
    settings: Settings,
}

impl Resolver {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run both phases over `descriptors`.
    ///
    /// Fails only on configuration problems (duplicate ids, zero costs,
    /// empty namespace), before any packing happens.
    pub fn resolve(
        &self,
        descriptors: &[ResourceDescriptor],
        sink: &mut dyn DiagnosticSink,
    ) -> PlanResult<Plan> {
        if self.settings.namespace.is_empty() {
            return Err(PlanError::EmptyNamespace);
        }
        let index = ResourceIndex::build(descriptors)?;
        let mut diag = Diagnostics::new(sink);

        debug!(
            namespace = %self.settings.namespace,
            descriptors = descriptors.len(),
            "planning run"
        );

        let base = collect(descriptors, &index, &mut diag);

        let batches = pack(&base, self.settings.resource_capacity);
        report_packing(PHASE1_BASE, &batches, self.settings.resource_capacity, &mut diag);
        let phase1 = allocate(&batches, &self.phase1_context(), &mut diag);

        let edges = extract_edges(&base, &phase1, &mut diag);

        let batches = pack(&edges, self.settings.edge_capacity);
        report_packing(PHASE2_BASE, &batches, self.settings.edge_capacity, &mut diag);
        let phase2 = allocate(&batches, &self.phase2_context(), &mut diag);

        let phase1 = phase1.into_containers();
        let mut phase2 = phase2.into_containers();
        let dependencies = wire_phases(&phase1, &mut phase2);

        if !phase2.is_empty() {
            diag.info(
                DiagnosticKind::Dependencies,
                format!(
                    "{} phase-2 containers depend on {} phase-1 containers",
                    phase2.len(),
                    phase1.len()
                ),
            );
        }

        debug!(
            phase1 = phase1.len(),
            phase2 = phase2.len(),
            warnings = diag.warning_count(),
            "planning run complete"
        );

        Ok(Plan {
            namespace: self.settings.namespace.clone(),
            phase1,
            phase2,
            dependencies,
            diagnostics: diag.into_recorded(),
        })
    }

    fn phase1_context(&self) -> AllocationContext {
        let ns = &self.settings.namespace;
        AllocationContext::new(ns.as_str(), PHASE1_BASE, ns.as_str())
            .with_shared(self.settings.shared.clone())
    }

    fn phase2_context(&self) -> AllocationContext {
        let ns = &self.settings.namespace;
        AllocationContext::new(ns.as_str(), PHASE2_BASE, format!("{ns}-refs"))
            .with_shared(self.settings.shared.clone())
    }
}

/// Validate every reference and split descriptors into the base set.
fn collect<'a>(
    descriptors: &'a [ResourceDescriptor],
    index: &ResourceIndex,
    diag: &mut Diagnostics<'_>,
) -> Vec<BaseResource<'a>> {
    let mut base = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let mut inline_refs = Vec::new();
        let mut cross_refs = Vec::new();
        let mut invalid = Vec::new();

        for (i, reference) in descriptor.forward_refs.iter().enumerate() {
            match reference.target.resolve(index) {
                Some(target) if *target == descriptor.id => inline_refs.push(reference.clone()),
                Some(target) => cross_refs.push(CrossRef {
                    index: i,
                    reference,
                    target: target.clone(),
                }),
                None => invalid.push(reference),
            }
        }

        let id = &descriptor.id;
        if !invalid.is_empty() && inline_refs.is_empty() && cross_refs.is_empty() {
            for reference in invalid {
                diag.warn(
                    DiagnosticKind::ExcludedDescriptor,
                    id.as_str(),
                    format!(
                        "excluding '{id}': invalid {} reference to '{}'",
                        reference.direction, reference.target
                    ),
                );
            }
            continue;
        }

        for reference in invalid {
            diag.warn(
                DiagnosticKind::InvalidReference,
                id.as_str(),
                format!(
                    "dropping {} reference from '{id}': unknown target '{}'",
                    reference.direction, reference.target
                ),
            );
        }

        base.push(BaseResource {
            descriptor,
            inline_refs,
            cross_refs,
        });
    }

    base
}

/// Lift cross references into edges whose endpoints both landed in phase 1.
fn extract_edges(
    base: &[BaseResource<'_>],
    phase1: &Allocation<ResourceRecord>,
    diag: &mut Diagnostics<'_>,
) -> Vec<ReferenceEdge> {
    let mut edges = Vec::new();

    for resource in base {
        let owner = &resource.descriptor.id;
        for cross in &resource.cross_refs {
            let direction = cross.reference.direction;
            let (source, target) = direction.orient(owner, &cross.target);
            let name = format!("{owner}{NAME_SEPARATOR}{direction}-{}", cross.index);

            match (phase1.location(source.as_str()), phase1.location(target.as_str())) {
                (Some(source_container), Some(target_container)) => edges.push(ReferenceEdge {
                    name,
                    owner: owner.clone(),
                    source: source.clone(),
                    target: target.clone(),
                    direction,
                    attributes: cross.reference.attributes.clone(),
                    cost: cross.reference.cost,
                    source_container: source_container.to_string(),
                    target_container: target_container.to_string(),
                }),
                _ => diag.warn(
                    DiagnosticKind::UnresolvedEdge,
                    name.as_str(),
                    format!(
                        "dropping edge '{name}': '{source}' or '{target}' has no phase-1 container"
                    ),
                ),
            }
        }
    }

    diag.info(
        DiagnosticKind::Packing,
        format!("collected {} reference edges for {PHASE2_BASE}", edges.len()),
    );
    edges
}

fn report_packing<T>(
    phase: &str,
    batches: &[Batch<'_, T>],
    capacity: Capacity,
    diag: &mut Diagnostics<'_>,
) {
    let summary = summarize(batches);
    diag.info(
        DiagnosticKind::Packing,
        format!(
            "{phase}: {} entries in {} batches ({} fragments), total cost {} at capacity {capacity}",
            summary.entries, summary.batches, summary.fragments, summary.total_cost
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, NullSink};
    use stackpack_core::{ConfigError, Direction};

    fn settings(resource: i64, edge: i64) -> Settings {
        Settings {
            namespace: "test".to_string(),
            ..Settings::with_capacities(resource, edge).unwrap()
        }
    }

    fn resolve(descriptors: &[ResourceDescriptor], s: Settings) -> (Plan, Vec<Diagnostic>) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let plan = Resolver::new(s).resolve(descriptors, &mut sink).unwrap();
        (plan, sink)
    }

    #[test]
    fn no_descriptors_no_containers() {
        let (plan, _) = resolve(&[], settings(400, 200));
        assert!(plan.is_empty());
        assert!(plan.dependencies.is_empty());
    }

    #[test]
    fn descriptors_without_refs_skip_phase2() {
        let descriptors = vec![
            ResourceDescriptor::new("a", 1),
            ResourceDescriptor::new("b", 1),
        ];
        let (plan, _) = resolve(&descriptors, settings(400, 200));
        assert_eq!(plan.phase1.len(), 1);
        assert_eq!(plan.phase1[0].name, "test");
        assert!(plan.phase2.is_empty());
    }

    #[test]
    fn ingress_edge_runs_from_target_to_owner() {
        let descriptors = vec![
            ResourceDescriptor::new("web", 2),
            ResourceDescriptor::new("app", 2)
                .with_ref(ForwardRef::new("web", Direction::Ingress)),
        ];
        let (plan, _) = resolve(&descriptors, settings(2, 200));

        let edge = plan.edges().next().unwrap();
        assert_eq!(edge.name, "app/ingress-0");
        assert_eq!(edge.source.as_str(), "web");
        assert_eq!(edge.target.as_str(), "app");
        assert_eq!(edge.source_container, "test-phase1-0");
        assert_eq!(edge.target_container, "test-phase1-1");
    }

    #[test]
    fn mixed_references_keep_valid_ones() {
        let descriptors = vec![
            ResourceDescriptor::new("a", 1),
            ResourceDescriptor::new("b", 1)
                .with_ref(ForwardRef::new("a", Direction::Egress))
                .with_ref(ForwardRef::new("ghost", Direction::Egress)),
        ];
        let (plan, sink) = resolve(&descriptors, settings(400, 200));

        assert_eq!(plan.locate("b"), Some("test"));
        let warnings: Vec<&Diagnostic> = sink.iter().filter(|d| d.is_warning()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, DiagnosticKind::InvalidReference);
        assert!(warnings[0].message.contains("ghost"));

        let edges: Vec<&ReferenceEdge> = plan.edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target.as_str(), "a");
    }

    #[test]
    fn self_references_stay_inline() {
        let descriptors = vec![
            ResourceDescriptor::new("loop", 1)
                .with_ref(ForwardRef::new("loop", Direction::Ingress)),
        ];
        let (plan, sink) = resolve(&descriptors, settings(400, 200));

        assert!(plan.phase2.is_empty());
        assert_eq!(plan.phase1[0].members[0].record.inline_refs.len(), 1);
        assert!(sink.iter().all(|d| !d.is_warning()));
    }

    #[test]
    fn edge_to_excluded_descriptor_is_dropped() {
        let descriptors = vec![
            ResourceDescriptor::new("orphan", 1)
                .with_ref(ForwardRef::new("missing", Direction::Egress)),
            ResourceDescriptor::new("client", 1)
                .with_ref(ForwardRef::new("orphan", Direction::Egress)),
        ];
        let (plan, sink) = resolve(&descriptors, settings(400, 200));

        assert_eq!(plan.locate("orphan"), None);
        assert_eq!(plan.locate("client"), Some("test"));
        assert!(plan.phase2.is_empty());
        let kinds: Vec<DiagnosticKind> =
            sink.iter().filter(|d| d.is_warning()).map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::ExcludedDescriptor, DiagnosticKind::UnresolvedEdge]
        );
    }

    #[test]
    fn edges_split_by_edge_capacity() {
        let mut descriptors = vec![ResourceDescriptor::new("hub", 1)];
        for i in 0..5 {
            descriptors.push(
                ResourceDescriptor::new(format!("spoke-{i}"), 1)
                    .with_ref(ForwardRef::new("hub", Direction::Egress)),
            );
        }
        let (plan, _) = resolve(&descriptors, settings(400, 2));

        assert_eq!(plan.phase1.len(), 1);
        let names: Vec<&str> = plan.phase2.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["test-phase2-0", "test-phase2-1", "test-phase2-2"]);
        assert!(plan
            .phase2
            .iter()
            .all(|c| c.parent.as_deref() == Some("test-refs")));
    }

    #[test]
    fn single_edge_batch_uses_refs_parent() {
        let descriptors = vec![
            ResourceDescriptor::new("a", 1),
            ResourceDescriptor::new("b", 1).with_ref(ForwardRef::new("a", Direction::Egress)),
        ];
        let (plan, _) = resolve(&descriptors, settings(400, 200));
        assert_eq!(plan.phase2.len(), 1);
        assert_eq!(plan.phase2[0].name, "test-refs");
        assert!(plan.phase2[0].depends_on.contains("test"));
    }

    #[test]
    fn duplicate_ids_abort_before_packing() {
        let descriptors = vec![
            ResourceDescriptor::new("a", 1),
            ResourceDescriptor::new("a", 1),
        ];
        let err = Resolver::new(settings(400, 200))
            .resolve(&descriptors, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, PlanError::Config(ConfigError::DuplicateId(_))));
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let s = Settings {
            namespace: String::new(),
            ..Settings::default()
        };
        let err = Resolver::new(s).resolve(&[], &mut NullSink).unwrap_err();
        assert!(matches!(err, PlanError::EmptyNamespace));
    }
}
