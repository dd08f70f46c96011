//! stackpack planner — capacity packing and two-phase reference resolution.
//!
//! Groups resource descriptors into deployment containers that stay under
//! a per-container cost ceiling, then wires cross-container references in
//! a second set of containers that deploy after the first.
//!
//! # Components
//!
//! - **`packer`** — Greedy, order-preserving batch builder
//! - **`allocator`** — Batches → named containers
//! - **`resolver`** — Two-phase planning over descriptors
//! - **`graph`** — Container dependency graph
//! - **`diagnostics`** — Injected diagnostics sink
//! - **`report`** — Text rendering of a plan

pub mod allocator;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod packer;
pub mod plan;
pub mod report;
pub mod resolver;

pub use allocator::{Allocatable, Allocation, AllocationContext, allocate};
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics, NullSink, Severity, TracingSink,
};
pub use error::{PlanError, PlanResult};
pub use graph::{DependencyGraph, wire_phases};
pub use packer::{Batch, BatchEntry, Fragment, PackSummary, Weighted, pack, summarize};
pub use plan::{Container, EdgeContainer, Member, Plan, ReferenceEdge, ResourceContainer, ResourceRecord};
pub use resolver::Resolver;

use stackpack_core::{ResourceDescriptor, Settings};

/// Plan `descriptors` with `settings`, reporting diagnostics to `sink`.
pub fn plan(
    descriptors: &[ResourceDescriptor],
    settings: &Settings,
    sink: &mut dyn DiagnosticSink,
) -> PlanResult<Plan> {
    Resolver::new(settings.clone()).resolve(descriptors, sink)
}
