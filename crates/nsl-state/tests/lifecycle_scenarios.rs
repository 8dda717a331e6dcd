//! # Lifecycle Scenario Tests
//!
//! End-to-end behaviour of the lifecycle machine over an in-memory tree:
//! preserve/restore round-trips, ancestor guards, effective-state
//! resolution, and the audit trail left by committed and rejected
//! transitions.

use nsl_core::{CorrelationId, NamespaceId, UserId};
use nsl_state::{
    InMemoryNamespaceStore, LifecycleError, LifecycleEvent, LifecycleStateMachine, Namespace,
    NamespaceState, NamespaceStore, PreserveEvent, StateMemoryStore, StateMetadata, StoreError,
    TransitionContext,
};
use proptest::prelude::*;

use NamespaceState::*;

const USER: UserId = UserId(7);

type Machine = LifecycleStateMachine<InMemoryNamespaceStore>;

/// Root (1) with a single child (2).
fn parent_and_child(parent: NamespaceState, child: NamespaceState) -> (Machine, Namespace) {
    let store = InMemoryNamespaceStore::new();
    store.create_root(NamespaceId(1), parent).unwrap();
    let child = store
        .create_child(NamespaceId(1), NamespaceId(2), child)
        .unwrap();
    (LifecycleStateMachine::new(store), child)
}

fn lone_root(state: NamespaceState) -> (Machine, Namespace) {
    let store = InMemoryNamespaceStore::new();
    let root = store.create_root(NamespaceId(1), state).unwrap();
    (LifecycleStateMachine::new(store), root)
}

// ─── Preserve / Restore ─────────────────────────────────────────────

proptest! {
    #[test]
    fn schedule_then_cancel_round_trips(
        start in prop::sample::select(vec![AncestorInherited, Archived]),
        user in 1i64..10_000,
    ) {
        let (machine, mut ns) = lone_root(start);
        let ctx = TransitionContext::by(UserId(user));
        prop_assert!(machine.schedule_deletion(&mut ns, ctx.clone()).unwrap().is_applied());
        prop_assert_eq!(ns.state, DeletionScheduled);
        prop_assert!(machine.cancel_deletion(&mut ns, ctx).unwrap().is_applied());
        prop_assert_eq!(ns.state, start);
        prop_assert!(ns.state_metadata.preserved_states.is_empty());
    }

    #[test]
    fn start_then_reschedule_round_trips(
        start in prop::sample::select(vec![AncestorInherited, Archived, DeletionScheduled]),
        user in 1i64..10_000,
    ) {
        let (machine, mut ns) = lone_root(start);
        let ctx = TransitionContext::by(UserId(user));
        prop_assert!(machine.start_deletion(&mut ns, ctx.clone()).unwrap().is_applied());
        prop_assert_eq!(ns.state, DeletionInProgress);
        prop_assert!(machine.reschedule_deletion(&mut ns, ctx).unwrap().is_applied());
        prop_assert_eq!(ns.state, start);
        prop_assert!(ns.state_metadata.preserved_states.is_empty());

        let stored = machine.store().find(ns.id).unwrap();
        prop_assert_eq!(stored.state, start);
    }
}

#[test]
fn test_memory_keeps_most_recent_preserved_state() {
    let mut metadata = StateMetadata::default();
    let mut memory = StateMemoryStore::new(&mut metadata);
    memory.save(PreserveEvent::StartDeletion, Archived);
    memory.save(PreserveEvent::StartDeletion, DeletionScheduled);
    assert_eq!(memory.read(PreserveEvent::StartDeletion), Some(DeletionScheduled));
    assert_eq!(metadata.preserved_states.len(), 1);
}

#[test]
fn test_memory_overwrite_through_machine() {
    let (machine, mut ns) = lone_root(Archived);
    machine.start_deletion(&mut ns, TransitionContext::by(USER)).unwrap();
    machine
        .store()
        .set_state(ns.id, DeletionScheduled)
        .unwrap();
    // A second preserve without an intervening restore.
    ns.state = DeletionScheduled;
    machine.start_deletion(&mut ns, TransitionContext::by(USER)).unwrap();
    assert_eq!(
        ns.state_metadata.preserved_state(PreserveEvent::StartDeletion),
        Some(DeletionScheduled)
    );
    assert_eq!(ns.state_metadata.preserved_states.len(), 1);
}

#[test]
fn test_clear_without_memory_is_noop() {
    let mut metadata = StateMetadata {
        last_error: Some("kept".to_string()),
        ..StateMetadata::default()
    };
    let before = metadata.clone();
    let removed = StateMemoryStore::new(&mut metadata).clear(PreserveEvent::ScheduleDeletion);
    assert!(!removed);
    assert_eq!(metadata, before);
}

// ─── Ancestor Guards ────────────────────────────────────────────────

#[test]
fn test_ancestor_guard_blocks_forbidden_states() {
    let cases = [
        (LifecycleEvent::Archive, AncestorInherited, Archived),
        (LifecycleEvent::Archive, AncestorInherited, DeletionScheduled),
        (LifecycleEvent::Archive, AncestorInherited, DeletionInProgress),
        (LifecycleEvent::Unarchive, Archived, DeletionScheduled),
        (LifecycleEvent::Unarchive, Archived, DeletionInProgress),
        (LifecycleEvent::ScheduleDeletion, AncestorInherited, DeletionScheduled),
        (LifecycleEvent::ScheduleDeletion, Archived, DeletionInProgress),
    ];
    for (event, child_state, parent_state) in cases {
        let (machine, mut child) = parent_and_child(parent_state, child_state);
        let outcome = machine
            .fire(&mut child, event, TransitionContext::by(USER))
            .unwrap();
        assert!(!outcome.is_applied(), "{event} under {parent_state} should be blocked");
        assert_eq!(child.state, child_state);
        assert_eq!(machine.store().find(child.id).unwrap().state, child_state);
        assert_eq!(
            outcome.reasons(),
            [format!("cannot be changed as ancestor ID 1 is {parent_state}")]
        );
    }
}

#[test]
fn test_ancestor_guard_allows_other_states() {
    let cases = [
        (LifecycleEvent::Archive, AncestorInherited, AncestorInherited, Archived),
        (LifecycleEvent::Unarchive, Archived, AncestorInherited, AncestorInherited),
        (LifecycleEvent::Unarchive, Archived, Archived, AncestorInherited),
        (LifecycleEvent::ScheduleDeletion, AncestorInherited, Archived, DeletionScheduled),
        (LifecycleEvent::ScheduleDeletion, Archived, AncestorInherited, DeletionScheduled),
        (LifecycleEvent::StartDeletion, AncestorInherited, DeletionInProgress, DeletionInProgress),
        (LifecycleEvent::StartDeletion, DeletionScheduled, DeletionScheduled, DeletionInProgress),
    ];
    for (event, child_state, parent_state, expected) in cases {
        let (machine, mut child) = parent_and_child(parent_state, child_state);
        let outcome = machine
            .fire(&mut child, event, TransitionContext::by(USER))
            .unwrap();
        assert!(outcome.is_applied(), "{event} under {parent_state} should be allowed");
        assert_eq!(child.state, expected);
    }
}

#[test]
fn test_ancestor_blocks_archive_scenario() {
    let (machine, mut child) = parent_and_child(DeletionScheduled, AncestorInherited);
    let outcome = machine.archive(&mut child, TransitionContext::by(USER)).unwrap();

    assert!(!outcome.is_applied());
    assert_eq!(child.state, AncestorInherited);
    let error = child.state_metadata.last_error.clone().unwrap();
    assert!(error.contains("ancestor ID 1"));
    assert!(error.contains("deletion_scheduled"));
}

#[test]
fn test_grandparent_blocks_through_inherited_parent() {
    let store = InMemoryNamespaceStore::new();
    store.create_root(NamespaceId(1), DeletionInProgress).unwrap();
    store
        .create_child(NamespaceId(1), NamespaceId(2), AncestorInherited)
        .unwrap();
    let mut leaf = store
        .create_child(NamespaceId(2), NamespaceId(3), AncestorInherited)
        .unwrap();
    let machine = LifecycleStateMachine::new(store);
    let outcome = machine.archive(&mut leaf, TransitionContext::by(USER)).unwrap();
    assert_eq!(
        outcome.reasons(),
        ["cannot be changed as ancestor ID 1 is deletion_in_progress"]
    );
}

// ─── Effective State ────────────────────────────────────────────────

#[test]
fn test_effective_state_inherits_through_chain() {
    let store = InMemoryNamespaceStore::new();
    store.create_root(NamespaceId(1), AncestorInherited).unwrap();
    store.create_child(NamespaceId(1), NamespaceId(2), Archived).unwrap();
    store
        .create_child(NamespaceId(2), NamespaceId(3), AncestorInherited)
        .unwrap();
    let c = store
        .create_child(NamespaceId(3), NamespaceId(4), AncestorInherited)
        .unwrap();
    let machine = LifecycleStateMachine::new(store);
    assert_eq!(machine.effective_state(&c).unwrap(), Archived);
}

#[test]
fn test_effective_state_of_isolated_root() {
    let (machine, root) = lone_root(AncestorInherited);
    assert_eq!(machine.effective_state(&root).unwrap(), AncestorInherited);
}

// ─── Actor Requirement ──────────────────────────────────────────────

#[test]
fn test_every_event_requires_transition_user() {
    let starts = [
        (LifecycleEvent::Archive, AncestorInherited, None),
        (LifecycleEvent::Unarchive, Archived, None),
        (LifecycleEvent::ScheduleDeletion, Archived, None),
        (
            LifecycleEvent::CancelDeletion,
            DeletionScheduled,
            Some((PreserveEvent::ScheduleDeletion, Archived)),
        ),
        (LifecycleEvent::StartDeletion, DeletionScheduled, None),
        (
            LifecycleEvent::RescheduleDeletion,
            DeletionInProgress,
            Some((PreserveEvent::StartDeletion, DeletionScheduled)),
        ),
    ];
    for (event, state, memory) in starts {
        let (machine, mut ns) = lone_root(state);
        if let Some((preserve, preserved)) = memory {
            ns.state_metadata.preserved_states.insert(preserve, preserved);
        }
        let outcome = machine
            .fire(&mut ns, event, TransitionContext::anonymous())
            .unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(
            outcome.reasons(),
            [format!("{event} transition needs transition_user")]
        );
        assert_eq!(ns.state, state);
    }
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[test]
fn test_schedule_then_cancel_scenario() {
    let (machine, mut ns) = lone_root(Archived);

    machine
        .schedule_deletion(&mut ns, TransitionContext::by(USER))
        .unwrap();
    assert_eq!(ns.state, DeletionScheduled);
    let preserved = serde_json::to_value(&ns.state_metadata.preserved_states).unwrap();
    assert_eq!(preserved, serde_json::json!({ "schedule_deletion": "archived" }));
    assert!(ns.state_metadata.deletion_scheduled_at.is_some());

    machine
        .cancel_deletion(&mut ns, TransitionContext::by(USER))
        .unwrap();
    assert_eq!(ns.state, Archived);
    assert!(ns.state_metadata.preserved_states.is_empty());
    assert!(ns.state_metadata.deletion_scheduled_at.is_none());

    let stored = machine.store().find(ns.id).unwrap();
    assert_eq!(stored.state_metadata, ns.state_metadata);
}

#[test]
fn test_full_deletion_lifecycle_with_reschedule() {
    let (machine, mut ns) = lone_root(AncestorInherited);
    let ctx = TransitionContext::by(USER);

    machine.schedule_deletion(&mut ns, ctx.clone()).unwrap();
    machine.start_deletion(&mut ns, ctx.clone()).unwrap();
    assert_eq!(ns.state, DeletionInProgress);

    machine.reschedule_deletion(&mut ns, ctx.clone()).unwrap();
    assert_eq!(ns.state, DeletionScheduled);

    machine.cancel_deletion(&mut ns, ctx).unwrap();
    assert_eq!(ns.state, AncestorInherited);
    assert!(ns.state_metadata.preserved_states.is_empty());
}

// ─── Audit Trail ────────────────────────────────────────────────────

#[test]
fn test_rejection_metadata_is_persisted() {
    let (machine, mut ns) = lone_root(DeletionInProgress);
    machine.archive(&mut ns, TransitionContext::by(USER)).unwrap();

    let stored = machine.store().find(ns.id).unwrap();
    assert_eq!(stored.state, DeletionInProgress);
    assert_eq!(
        stored.state_metadata.last_error.as_deref(),
        Some(
            "Cannot transition from deletion_in_progress to deletion_in_progress via archive: \
             cannot transition via archive"
        )
    );
    assert_eq!(stored.state_metadata.last_changed_by_user_id, Some(USER));
}

#[test]
fn test_store_failure_leaves_namespace_untouched() {
    let (machine, mut ns) = lone_root(Archived);
    machine.store().fail_writes(true);

    let result = machine.schedule_deletion(&mut ns, TransitionContext::by(USER));
    assert!(matches!(
        result,
        Err(LifecycleError::Store(StoreError::Backend(_)))
    ));
    assert_eq!(ns.state, Archived);
    assert!(ns.state_metadata.preserved_states.is_empty());

    machine.store().fail_writes(false);
    assert_eq!(machine.store().find(ns.id).unwrap().state, Archived);
}

#[test]
fn test_correlation_id_flows_into_record_and_metadata() {
    let (machine, mut ns) = lone_root(AncestorInherited);
    let ctx = TransitionContext::by(USER).with_correlation_id(CorrelationId::new("req-123"));
    let outcome = machine.archive(&mut ns, ctx).unwrap();

    let record = outcome.record().unwrap();
    assert_eq!(record.correlation_id.as_str(), "req-123");
    assert_eq!(record.from_state, AncestorInherited);
    assert_eq!(record.to_state, Archived);
    assert_eq!(record.user_id, Some(USER));

    let stored = machine.store().find(ns.id).unwrap();
    assert_eq!(
        stored.state_metadata.correlation_id,
        Some(CorrelationId::new("req-123"))
    );
}
