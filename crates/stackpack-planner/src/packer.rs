//! Greedy, order-preserving interval builder.
//!
//! Walks a cost-weighted sequence and closes a batch whenever the next
//! whole item would overflow it. Items larger than the capacity are split
//! into single-item fragment batches, so packing never fails.

use std::mem;

use serde::{Deserialize, Serialize};
use stackpack_core::{Capacity, ResourceDescriptor};
use tracing::debug;

/// Anything that contributes a cost to a batch.
pub trait Weighted {
    fn cost(&self) -> u32;
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn cost(&self) -> u32 {
        (**self).cost()
    }
}

impl Weighted for ResourceDescriptor {
    fn cost(&self) -> u32 {
        self.cost
    }
}

/// Position of a fragment within a split item (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    pub part_index: u32,
    pub part_count: u32,
}

/// One item (or item fragment) inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry<'a, T> {
    pub item: &'a T,
    /// Index of the item in the packed input.
    pub position: usize,
    /// Cost this entry occupies; less than the item's cost for fragments.
    pub cost: u32,
}

/// A contiguous run of the input whose summed cost fits the capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<'a, T> {
    pub entries: Vec<BatchEntry<'a, T>>,
    pub total_cost: u32,
    /// Set when this batch holds one fragment of an oversized item.
    pub fragment: Option<Fragment>,
}

impl<'a, T> Batch<'a, T> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total_cost: 0,
            fragment: None,
        }
    }

    fn push(&mut self, item: &'a T, position: usize, cost: u32) {
        self.entries.push(BatchEntry { item, position, cost });
        self.total_cost += cost;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// Input positions covered by this batch, as an inclusive range.
    pub fn span(&self) -> Option<(usize, usize)> {
        let first = self.entries.first()?.position;
        let last = self.entries.last()?.position;
        Some((first, last))
    }
}

/// Partition `items` into capacity-bounded batches, preserving order.
///
/// Every item appears in exactly one batch, or, when its cost exceeds the
/// capacity, in `ceil(cost / capacity)` consecutive fragment batches.
pub fn pack<T: Weighted>(items: &[T], capacity: Capacity) -> Vec<Batch<'_, T>> {
    let cap = capacity.get();
    let mut batches = Vec::new();
    let mut current = Batch::empty();

    for (position, item) in items.iter().enumerate() {
        let cost = item.cost();

        if cost > cap {
            if !current.is_empty() {
                batches.push(mem::replace(&mut current, Batch::empty()));
            }

            let part_count = cost.div_ceil(cap);
            let mut remaining = cost;
            for part_index in 1..=part_count {
                let part_cost = remaining.min(cap);
                remaining -= part_cost;

                let mut fragment = Batch::empty();
                fragment.push(item, position, part_cost);
                fragment.fragment = Some(Fragment { part_index, part_count });
                batches.push(fragment);
            }
            debug!(position, cost, parts = part_count, "split oversized item");
            continue;
        }

        // total_cost never exceeds cap, so the subtraction cannot underflow.
        if cost > cap - current.total_cost {
            debug!(
                items = current.len(),
                cost = current.total_cost,
                "closing batch"
            );
            batches.push(mem::replace(&mut current, Batch::empty()));
        }
        current.push(item, position, cost);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

/// Totals over a packed batch list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackSummary {
    pub batches: usize,
    pub fragments: usize,
    pub entries: usize,
    pub total_cost: u64,
}

pub fn summarize<T>(batches: &[Batch<'_, T>]) -> PackSummary {
    batches.iter().fold(PackSummary::default(), |mut s, b| {
        s.batches += 1;
        s.entries += b.len();
        s.total_cost += u64::from(b.total_cost);
        if b.is_fragment() {
            s.fragments += 1;
        }
        s
    })
}
