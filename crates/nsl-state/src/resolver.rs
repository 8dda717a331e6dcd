//! # Effective State Resolution
//!
//! A namespace in `ancestor_inherited` behaves as its closest ancestor with
//! an explicit state. Resolution fetches all ancestor states in one bulk
//! read and then picks by position in `traversal_ids`, so the result does
//! not depend on how ids happen to be ordered numerically.
//!
//! Ancestors are read as a snapshot. Concurrent transitions elsewhere in the
//! tree may not be observed consistently across a deep chain.

use std::collections::HashMap;

use nsl_core::NamespaceId;

use crate::lifecycle::NamespaceState;
use crate::namespace::Namespace;
use crate::store::{NamespaceStore, StoreError};

/// Resolves the state a namespace behaves as.
pub struct EffectiveStateResolver<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: NamespaceStore + ?Sized> EffectiveStateResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// The state `namespace` behaves as right now.
    ///
    /// Explicit own states and roots short-circuit without touching the
    /// store. Otherwise the closest explicit ancestor wins, falling back to
    /// `ancestor_inherited`.
    pub fn effective_state(&self, namespace: &Namespace) -> Result<NamespaceState, StoreError> {
        if namespace.state.is_explicit() || namespace.is_root() {
            return Ok(namespace.state);
        }
        let ancestors = namespace.ancestor_ids();
        if ancestors.is_empty() {
            return Ok(namespace.state);
        }
        let states = self.store.states_of(ancestors)?;
        Ok(closest_explicit_ancestor(ancestors, &states)
            .map(|(_, state)| state)
            .unwrap_or(NamespaceState::AncestorInherited))
    }
}

/// The closest ancestor (deepest first) whose state satisfies `predicate`.
pub(crate) fn closest_ancestor_matching(
    ancestors: &[NamespaceId],
    states: &[(NamespaceId, NamespaceState)],
    predicate: impl Fn(NamespaceState) -> bool,
) -> Option<(NamespaceId, NamespaceState)> {
    let by_id: HashMap<NamespaceId, NamespaceState> = states.iter().copied().collect();
    ancestors
        .iter()
        .rev()
        .filter_map(|id| by_id.get(id).map(|state| (*id, *state)))
        .find(|(_, state)| predicate(*state))
}

fn closest_explicit_ancestor(
    ancestors: &[NamespaceId],
    states: &[(NamespaceId, NamespaceState)],
) -> Option<(NamespaceId, NamespaceState)> {
    closest_ancestor_matching(ancestors, states, |state| state.is_explicit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNamespaceStore;

    use NamespaceState::*;

    fn chain(states: &[NamespaceState]) -> (InMemoryNamespaceStore, Vec<Namespace>) {
        let store = InMemoryNamespaceStore::new();
        let mut namespaces: Vec<Namespace> = Vec::new();
        for (i, state) in states.iter().enumerate() {
            let id = NamespaceId(i as i64 + 1);
            let ns = match namespaces.last() {
                None => store.create_root(id, *state).unwrap(),
                Some(parent) => store.create_child(parent.id, id, *state).unwrap(),
            };
            namespaces.push(ns);
        }
        (store, namespaces)
    }

    #[test]
    fn test_explicit_own_state_wins() {
        let (store, nss) = chain(&[Archived, DeletionScheduled]);
        let resolver = EffectiveStateResolver::new(&store);
        store.reset_round_trips();
        assert_eq!(resolver.effective_state(&nss[1]).unwrap(), DeletionScheduled);
        assert_eq!(store.round_trips(), 0);
    }

    #[test]
    fn test_root_ancestor_inherited_resolves_to_itself() {
        let (store, nss) = chain(&[AncestorInherited]);
        let resolver = EffectiveStateResolver::new(&store);
        assert_eq!(resolver.effective_state(&nss[0]).unwrap(), AncestorInherited);
    }

    #[test]
    fn test_inherits_from_archived_grandparent() {
        let (store, nss) = chain(&[AncestorInherited, Archived, AncestorInherited, AncestorInherited]);
        let resolver = EffectiveStateResolver::new(&store);
        assert_eq!(resolver.effective_state(&nss[3]).unwrap(), Archived);
    }

    #[test]
    fn test_no_explicit_ancestor() {
        let (store, nss) = chain(&[AncestorInherited, AncestorInherited, AncestorInherited]);
        let resolver = EffectiveStateResolver::new(&store);
        assert_eq!(resolver.effective_state(&nss[2]).unwrap(), AncestorInherited);
    }

    #[test]
    fn test_closest_ancestor_wins() {
        let (store, nss) = chain(&[DeletionScheduled, Archived, AncestorInherited]);
        let resolver = EffectiveStateResolver::new(&store);
        assert_eq!(resolver.effective_state(&nss[2]).unwrap(), Archived);
    }

    #[test]
    fn test_closest_by_depth_not_by_id() {
        let store = InMemoryNamespaceStore::new();
        store.create_root(NamespaceId(300), DeletionScheduled).unwrap();
        store.create_child(NamespaceId(300), NamespaceId(200), Archived).unwrap();
        let child = store
            .create_child(NamespaceId(200), NamespaceId(100), AncestorInherited)
            .unwrap();
        let resolver = EffectiveStateResolver::new(&store);
        assert_eq!(resolver.effective_state(&child).unwrap(), Archived);
    }

    #[test]
    fn test_one_round_trip_regardless_of_depth() {
        let mut states = vec![Archived];
        states.extend(std::iter::repeat(AncestorInherited).take(10));
        let (store, nss) = chain(&states);
        let resolver = EffectiveStateResolver::new(&store);
        store.reset_round_trips();
        assert_eq!(resolver.effective_state(&nss[10]).unwrap(), Archived);
        assert_eq!(store.round_trips(), 1);
    }
}
