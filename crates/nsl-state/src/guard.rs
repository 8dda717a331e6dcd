//! # Transition Guards
//!
//! Checks run before a transition commits. Both always run so that every
//! reason ends up on the namespace's `state` errors; the transition is
//! vetoed if either fails.
//!
//! - **Actor requirement.** Every transition names the user making it.
//! - **Ancestor state.** Some events are forbidden while any ancestor holds
//!   one of a set of explicit states:
//!
//! | Event               | Forbidden ancestor states                                  |
//! |---------------------|------------------------------------------------------------|
//! | `archive`           | `archived`, `deletion_in_progress`, `deletion_scheduled`   |
//! | `unarchive`         | `deletion_in_progress`, `deletion_scheduled`               |
//! | `schedule_deletion` | `deletion_in_progress`, `deletion_scheduled`               |
//!
//! Events not listed are unconstrained by ancestors.

use crate::lifecycle::{LifecycleEvent, NamespaceState};
use crate::namespace::{Namespace, STATE_ATTRIBUTE};
use crate::resolver::closest_ancestor_matching;
use crate::store::{NamespaceStore, StoreError};
use crate::transition::TransitionContext;

/// Ancestor states that forbid `event`. Empty when unconstrained.
pub fn forbidden_ancestor_states_for(event: LifecycleEvent) -> &'static [NamespaceState] {
    use NamespaceState::*;
    match event {
        LifecycleEvent::Archive => &[Archived, DeletionInProgress, DeletionScheduled],
        LifecycleEvent::Unarchive => &[DeletionInProgress, DeletionScheduled],
        LifecycleEvent::ScheduleDeletion => &[DeletionInProgress, DeletionScheduled],
        LifecycleEvent::CancelDeletion
        | LifecycleEvent::StartDeletion
        | LifecycleEvent::RescheduleDeletion => &[],
    }
}

/// Pre-commit checks for a single transition attempt.
pub struct TransitionGuard<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: NamespaceStore + ?Sized> TransitionGuard<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Run every check. Returns `Ok(false)` when any check added an error.
    ///
    /// `Err` only when the ancestor read itself fails.
    pub fn check(
        &self,
        namespace: &mut Namespace,
        event: LifecycleEvent,
        context: &TransitionContext,
    ) -> Result<bool, StoreError> {
        let has_user = validate_transition_user(namespace, event, context);
        let ancestors_ok = self.validate_ancestors_state(namespace, event)?;
        Ok(has_user && ancestors_ok)
    }

    /// Reject `event` if any ancestor sits in a forbidden state.
    ///
    /// Ancestors are scanned closest first in one bulk read; roots and
    /// unconstrained events pass without touching the store.
    pub fn validate_ancestors_state(
        &self,
        namespace: &mut Namespace,
        event: LifecycleEvent,
    ) -> Result<bool, StoreError> {
        let forbidden = forbidden_ancestor_states_for(event);
        let ancestors = namespace.ancestor_ids();
        if forbidden.is_empty() || ancestors.is_empty() {
            return Ok(true);
        }

        let states = self.store.states_of(ancestors)?;
        let blocking = closest_ancestor_matching(ancestors, &states, |state| {
            state.is_explicit() && forbidden.contains(&state)
        });

        match blocking {
            Some((ancestor_id, state)) => {
                namespace.errors.add(
                    STATE_ATTRIBUTE,
                    format!("cannot be changed as ancestor ID {ancestor_id} is {state}"),
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}

/// Reject transitions that carry no acting user.
pub fn validate_transition_user(
    namespace: &mut Namespace,
    event: LifecycleEvent,
    context: &TransitionContext,
) -> bool {
    if context.transition_user.is_some() {
        return true;
    }
    namespace
        .errors
        .add(STATE_ATTRIBUTE, format!("{event} transition needs transition_user"));
    false
}
