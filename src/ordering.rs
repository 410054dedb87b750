//! Shared ordering (C7): the tuple every candidate path and every search
//! frontier entry is compared by, and a bounded result set that keeps only
//! the best `K` distinct routes.
//!
//! Both the search engine's priority queue (`search`) and the orchestrators'
//! result sets order candidates the same way, so the comparison key lives
//! here once rather than being duplicated.

use crate::decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// `(cost ascending, hops ascending, route signature ascending, insertion
/// order ascending)`. Lower is better. `route_signature` breaks ties between
/// equal-cost equal-hop routes deterministically by the sequence of orders
/// used; `insertion_order` is the final tiebreaker so that, failing every
/// other distinguishing field, the candidate discovered first wins —
/// guaranteeing determinism under permuted input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub cost: Decimal,
    pub hops: u32,
    pub route_signature: String,
    pub insertion_order: u64,
}

impl OrderKey {
    pub fn new(cost: Decimal, hops: u32, route_signature: String, insertion_order: u64) -> Self {
        OrderKey {
            cost,
            hops,
            route_signature,
            insertion_order,
        }
    }

    fn cmp_canonical(&self, other: &Self) -> Ordering {
        self.cost
            .cmp_value(&other.cost)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| self.route_signature.cmp(&other.route_signature))
            .then_with(|| self.insertion_order.cmp(&other.insertion_order))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_canonical(other)
    }
}

/// A ranked entry: whatever payload `T` is, ordered by its `OrderKey`.
#[derive(Clone, Debug)]
pub struct Ranked<T> {
    pub key: OrderKey,
    pub value: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// A result set bounded to the best `K` candidates by `OrderKey`, deduping
/// by route signature: a later candidate with a signature already present
/// only replaces the existing entry if it ranks strictly better.
#[derive(Clone, Debug, Default)]
pub struct BoundedResultSet<T> {
    limit: usize,
    entries: BTreeSet<Ranked<T>>,
    signatures: std::collections::HashMap<String, OrderKey>,
}

impl<T: Clone> BoundedResultSet<T> {
    pub fn new(limit: usize) -> Self {
        BoundedResultSet {
            limit: limit.max(1),
            entries: BTreeSet::new(),
            signatures: std::collections::HashMap::new(),
        }
    }

    /// Offers a candidate. Returns `true` if it was accepted (inserted or
    /// replaced an existing entry with the same route signature).
    pub fn offer(&mut self, key: OrderKey, value: T) -> bool {
        if let Some(existing) = self.signatures.get(&key.route_signature).cloned() {
            if key.cmp(&existing) != Ordering::Less {
                return false;
            }
            self.entries.remove(&Ranked {
                key: existing,
                value: value.clone(),
            });
        }

        self.signatures
            .insert(key.route_signature.clone(), key.clone());
        self.entries.insert(Ranked { key, value });

        while self.entries.len() > self.limit {
            if let Some(worst) = self.entries.iter().next_back().cloned() {
                self.signatures.remove(&worst.key.route_signature);
                self.entries.remove(&worst);
            }
        }
        true
    }

    pub fn into_sorted_values(self) -> Vec<T> {
        self.entries.into_iter().map(|r| r.value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
