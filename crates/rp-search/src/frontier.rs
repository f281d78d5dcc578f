//! Open set for best-first search.
//!
//! # Structure
//!
//! ```text
//! by_cost: BTreeMap<total cost, VecDeque<(id, node)>>   pop order
//! open:    FxHashMap<id, total cost>                    membership + key lookup
//! ```
//!
//! Entries that share a cost sit in the same bucket in insertion order, so
//! ties are neither dropped nor reordered and keys are stored exactly as
//! computed.  Each directional id has at most one open entry: a second push
//! either replaces it (strictly cheaper) or is refused.

use std::collections::{BTreeMap, VecDeque};

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use rp_core::DirectionalLinkId;

#[derive(Debug, Default)]
pub(crate) struct Frontier {
    by_cost: BTreeMap<OrderedFloat<f64>, VecDeque<(DirectionalLinkId, usize)>>,
    open:    FxHashMap<DirectionalLinkId, OrderedFloat<f64>>,
}

impl Frontier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.open.len()
    }

    /// Current key of `id`'s open entry.
    #[cfg(test)]
    pub(crate) fn cost_of(&self, id: DirectionalLinkId) -> Option<f64> {
        self.open.get(&id).map(|c| c.into_inner())
    }

    /// Whether [`push`](Self::push) would accept `id` at `cost`.
    pub(crate) fn accepts(&self, id: DirectionalLinkId, cost: f64) -> bool {
        self.open.get(&id).is_none_or(|&old| OrderedFloat(cost) < old)
    }

    /// Open `id` (arena slot `node`) at `cost`, replacing a dearer entry for
    /// the same id.  Returns `false` and changes nothing if the existing
    /// entry is as cheap or cheaper.
    pub(crate) fn push(&mut self, id: DirectionalLinkId, node: usize, cost: f64) -> bool {
        if !self.accepts(id, cost) {
            return false;
        }
        let key = OrderedFloat(cost);
        if let Some(old) = self.open.insert(id, key) {
            self.remove_entry(old, id);
        }
        self.by_cost.entry(key).or_default().push_back((id, node));
        true
    }

    /// Take the cheapest entry; among equal costs the earliest pushed.
    pub(crate) fn pop(&mut self) -> Option<(DirectionalLinkId, usize)> {
        let mut bucket = self.by_cost.first_entry()?;
        let entry = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        let (id, node) = entry?;
        self.open.remove(&id);
        Some((id, node))
    }

    fn remove_entry(&mut self, key: OrderedFloat<f64>, id: DirectionalLinkId) {
        if let Some(bucket) = self.by_cost.get_mut(&key) {
            bucket.retain(|&(other, _)| other != id);
            if bucket.is_empty() {
                self.by_cost.remove(&key);
            }
        }
    }

    /// Every open entry as `(cost, id)`, cheapest first.
    #[cfg(test)]
    pub(crate) fn entries(&self) -> Vec<(f64, DirectionalLinkId)> {
        self.by_cost
            .iter()
            .flat_map(|(cost, bucket)| bucket.iter().map(move |&(id, _)| (cost.into_inner(), id)))
            .collect()
    }
}
