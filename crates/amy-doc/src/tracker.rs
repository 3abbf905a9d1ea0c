//! The identifier / back-reference index.
//!
//! Maintained incrementally by the universe as elements attach, detach and
//! change attributes. Insertion is lenient: a duplicate identifier value
//! never rejects, it stacks, and the validation engine flags every
//! claimant. All lookups are O(1) expected in the number of worlds and
//! identifiers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ids::{ElementId, WorldId};

/// Incremental index of identifiers and references.
///
/// Scoping (walking ancestor worlds) is the universe's job; the tracker
/// itself stores flat `(world, family)` buckets.
#[derive(Debug, Default)]
pub struct RefTracker {
    /// `(scope world, family) → value → claiming elements` in registration
    /// order; the last claimant is the visible one.
    identifiers: HashMap<(WorldId, String), BTreeMap<String, Vec<ElementId>>>,

    /// `(scope world, family, value) → {(referring element, attribute name)}`.
    back_refs: HashMap<(WorldId, String, String), BTreeSet<(ElementId, String)>>,
}

impl RefTracker {
    /// Register an identifier value scoped to `world`.
    pub fn register_identifier(
        &mut self,
        world: WorldId,
        family: &str,
        value: &str,
        element: ElementId,
    ) {
        self.identifiers
            .entry((world, family.to_string()))
            .or_default()
            .entry(value.to_string())
            .or_default()
            .push(element);
    }

    /// Remove one element's claim on an identifier value.
    pub fn unregister_identifier(
        &mut self,
        world: WorldId,
        family: &str,
        value: &str,
        element: ElementId,
    ) {
        let key = (world, family.to_string());
        let Some(values) = self.identifiers.get_mut(&key) else {
            return;
        };
        if let Some(claimants) = values.get_mut(value) {
            claimants.retain(|&e| e != element);
            if claimants.is_empty() {
                values.remove(value);
            }
        }
        if values.is_empty() {
            self.identifiers.remove(&key);
        }
    }

    /// Register a back-reference from `(element, attribute)` to a value.
    pub fn register_reference(
        &mut self,
        world: WorldId,
        family: &str,
        value: &str,
        element: ElementId,
        attribute: &str,
    ) {
        self.back_refs
            .entry((world, family.to_string(), value.to_string()))
            .or_default()
            .insert((element, attribute.to_string()));
    }

    /// Remove a back-reference.
    pub fn unregister_reference(
        &mut self,
        world: WorldId,
        family: &str,
        value: &str,
        element: ElementId,
        attribute: &str,
    ) {
        let key = (world, family.to_string(), value.to_string());
        if let Some(refs) = self.back_refs.get_mut(&key) {
            refs.remove(&(element, attribute.to_string()));
            if refs.is_empty() {
                self.back_refs.remove(&key);
            }
        }
    }

    /// True when `value` is registered in the `(world, family)` bucket.
    pub fn has_identifier(&self, world: WorldId, family: &str, value: &str) -> bool {
        self.identifiers
            .get(&(world, family.to_string()))
            .is_some_and(|values| values.contains_key(value))
    }

    /// Identifier values registered directly in `(world, family)`.
    pub fn identifiers_in(&self, world: WorldId, family: &str) -> Vec<String> {
        self.identifiers
            .get(&(world, family.to_string()))
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All elements claiming a value in `(world, family)`; more than one
    /// means a duplicate-identifier conflict.
    pub fn claimants(&self, world: WorldId, family: &str, value: &str) -> Vec<ElementId> {
        self.identifiers
            .get(&(world, family.to_string()))
            .and_then(|values| values.get(value))
            .cloned()
            .unwrap_or_default()
    }

    /// The visible (most recently registered) claimant of a value.
    pub fn resolve(&self, world: WorldId, family: &str, value: &str) -> Option<ElementId> {
        self.claimants(world, family, value).last().copied()
    }

    /// Referring `(element, attribute)` pairs for `(family, value)` scoped
    /// to `world`.
    pub fn references(&self, world: WorldId, family: &str, value: &str) -> Vec<(ElementId, String)> {
        self.back_refs
            .get(&(world, family.to_string(), value.to_string()))
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Pick an identifier not present in `taken`.
///
/// Continues the dominant `prefix_N` naming already in use when there is
/// one (so a world of `rect_1`, `rect_2` grows a `rect_3`); otherwise falls
/// back to a short prefix derived from the family name. The numeric suffix
/// is the smallest positive integer not yet taken for the prefix.
pub fn pick_unique_identifier(family: &str, taken: &BTreeSet<String>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in taken {
        if let Some((prefix, tail)) = value.rsplit_once('_')
            && !prefix.is_empty()
            && tail.parse::<u64>().is_ok()
        {
            *counts.entry(prefix).or_default() += 1;
        }
    }

    // BTreeMap iteration order makes ties deterministic (smallest prefix).
    let prefix = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(prefix, _)| (*prefix).to_string())
        .unwrap_or_else(|| family.chars().take(4).collect());

    let mut n: u64 = 1;
    loop {
        let candidate = format!("{prefix}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
