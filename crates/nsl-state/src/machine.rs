//! # Lifecycle State Machine
//!
//! Fires events on namespaces. One call to [`LifecycleStateMachine::fire`]
//! runs the full sequence around a single transition:
//!
//! 1. Resolve the destination from the rule table. Restore events read the
//!    state preserved by their paired preserve event. If no destination
//!    resolves, the actor requirement is still checked before rejecting.
//! 2. Run the guards. Any failure vetoes the transition: only the auditor's
//!    failure path runs and `state` is left untouched.
//! 3. On acceptance apply the new state, save or clear preserved memory,
//!    merge the audit fields, then persist state and metadata in one write.
//!    If that write fails the in-memory namespace is rolled back.
//! 4. Log the committed transition.
//!
//! Guard rejections come back as [`TransitionOutcome::Rejected`]. Only
//! storage failures are errors. A failed ancestor read aborts before any
//! audit record is written.

use thiserror::Error;

use nsl_core::{CorrelationId, Timestamp};

use crate::audit::TransitionAuditor;
use crate::guard::{validate_transition_user, TransitionGuard};
use crate::lifecycle::{LifecycleEvent, NamespaceState, RestoreEvent, Target};
use crate::memory::StateMemoryStore;
use crate::namespace::{Namespace, STATE_ATTRIBUTE};
use crate::resolver::EffectiveStateResolver;
use crate::store::{NamespaceStore, StoreError};
use crate::transition::{Transition, TransitionContext, TransitionRecord};

// ─── Errors and Outcomes ─────────────────────────────────────────────

/// Infrastructure failures while running a transition.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("namespace store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of firing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition committed.
    Applied(TransitionRecord),
    /// A guard vetoed the transition; `state` is unchanged.
    Rejected {
        /// Messages recorded on the `state` attribute.
        reasons: Vec<String>,
        /// The composed message stored as `last_error`.
        error: String,
    },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn record(&self) -> Option<&TransitionRecord> {
        match self {
            Self::Applied(record) => Some(record),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Applied(_) => &[],
            Self::Rejected { reasons, .. } => reasons,
        }
    }
}

// ─── State Machine ───────────────────────────────────────────────────

/// The namespace lifecycle state machine over a [`NamespaceStore`].
#[derive(Debug, Clone)]
pub struct LifecycleStateMachine<S> {
    store: S,
}

impl<S: NamespaceStore> LifecycleStateMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fire `event` on `namespace`.
    ///
    /// Errors from a previous attempt are cleared first, so the namespace's
    /// `state` errors afterwards describe this attempt only.
    pub fn fire(
        &self,
        namespace: &mut Namespace,
        event: LifecycleEvent,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        namespace.errors.clear();
        let from = namespace.state;
        let correlation_id = context
            .correlation_id
            .clone()
            .unwrap_or_else(CorrelationId::generate);
        let mut transition = Transition {
            event,
            from,
            to: from,
            user_id: context.transition_user,
            correlation_id,
        };

        match self.resolve_target(namespace, event) {
            Ok(to) => transition.to = to,
            Err(reason) => {
                namespace.errors.add(STATE_ATTRIBUTE, reason);
                validate_transition_user(namespace, event, &context);
                return self.reject(namespace, &transition);
            }
        }

        let guard = TransitionGuard::new(&self.store);
        let allowed = match guard.check(namespace, event, &context) {
            Ok(allowed) => allowed,
            Err(err) => {
                // Nothing is audited when ancestors cannot be read.
                namespace.errors.clear();
                return Err(err.into());
            }
        };
        if !allowed {
            return self.reject(namespace, &transition);
        }

        self.commit(namespace, &transition)
    }

    pub fn archive(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::Archive, context)
    }

    pub fn unarchive(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::Unarchive, context)
    }

    pub fn schedule_deletion(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::ScheduleDeletion, context)
    }

    pub fn cancel_deletion(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::CancelDeletion, context)
    }

    /// Move into deletion, either after an explicit schedule or because an
    /// ancestor's deletion swept this namespace in.
    pub fn start_deletion(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::StartDeletion, context)
    }

    pub fn reschedule_deletion(
        &self,
        namespace: &mut Namespace,
        context: TransitionContext,
    ) -> Result<TransitionOutcome, LifecycleError> {
        self.fire(namespace, LifecycleEvent::RescheduleDeletion, context)
    }

    /// Whether the rule table allows `event` from the namespace's current
    /// state, including a resolvable restore destination. Guards are not
    /// evaluated.
    pub fn can_fire(&self, namespace: &Namespace, event: LifecycleEvent) -> bool {
        self.resolve_target(namespace, event).is_ok()
    }

    /// Events the rule table and the ancestor guard would let `namespace`
    /// fire right now. The actor requirement is not considered.
    pub fn permitted_events(
        &self,
        namespace: &Namespace,
    ) -> Result<Vec<LifecycleEvent>, LifecycleError> {
        let guard = TransitionGuard::new(&self.store);
        let mut scratch = namespace.clone();
        let mut permitted = Vec::new();
        for event in LifecycleEvent::available_from(namespace.state) {
            if !self.can_fire(namespace, event) {
                continue;
            }
            scratch.errors.clear();
            if guard.validate_ancestors_state(&mut scratch, event)? {
                permitted.push(event);
            }
        }
        Ok(permitted)
    }

    /// The state `namespace` behaves as, after inheritance.
    pub fn effective_state(&self, namespace: &Namespace) -> Result<NamespaceState, LifecycleError> {
        Ok(EffectiveStateResolver::new(&self.store).effective_state(namespace)?)
    }

    /// Destination of `event` from the namespace's current state.
    ///
    /// `Err` carries the validation message to attach to `state`.
    fn resolve_target(
        &self,
        namespace: &Namespace,
        event: LifecycleEvent,
    ) -> Result<NamespaceState, String> {
        let rule = event.rule();
        if !rule.accepts(namespace.state) {
            return Err(format!("cannot transition via {event}"));
        }
        match rule.to {
            Target::Fixed(state) => Ok(state),
            Target::Restored(restore) => restored_target(namespace, restore).ok_or_else(|| {
                tracing::error!(
                    namespace_id = %namespace.id,
                    event = %event,
                    preserved = ?namespace.state_metadata.preserved_state(restore.preserve_event()),
                    "no preserved state matches a restore target"
                );
                format!("has no preserved state to restore via {event}")
            }),
        }
    }

    fn reject(
        &self,
        namespace: &mut Namespace,
        transition: &Transition,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let error = TransitionAuditor::new(&self.store).record_failure(namespace, transition)?;
        Ok(TransitionOutcome::Rejected {
            reasons: namespace.state_errors().to_vec(),
            error,
        })
    }

    fn commit(
        &self,
        namespace: &mut Namespace,
        transition: &Transition,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let snapshot = namespace.clone();

        namespace.state = transition.to;

        let mut memory = StateMemoryStore::new(&mut namespace.state_metadata);
        if let Some(preserve) = transition.event.as_preserve() {
            memory.save(preserve, transition.from);
        }
        if let Some(restore) = transition.event.as_restore() {
            memory.clear(restore.preserve_event());
        }

        let auditor = TransitionAuditor::new(&self.store);
        auditor.record_success(namespace, transition);

        if let Err(err) = self.store.save(namespace) {
            *namespace = snapshot;
            return Err(err.into());
        }

        auditor.log_success(namespace, transition);

        Ok(TransitionOutcome::Applied(TransitionRecord {
            namespace_id: namespace.id,
            event: transition.event,
            from_state: transition.from,
            to_state: transition.to,
            user_id: transition.user_id,
            correlation_id: transition.correlation_id.clone(),
            timestamp: namespace
                .state_metadata
                .last_updated_at
                .unwrap_or_else(Timestamp::now),
        }))
    }
}

/// Whether `restore` would return `namespace` to `target`.
///
/// True when the memory kept by the paired preserve event equals `target`
/// and `target` is a declared destination of `restore`.
pub fn restores_to(namespace: &Namespace, restore: RestoreEvent, target: NamespaceState) -> bool {
    restore.targets().any(|candidate| candidate == target)
        && namespace
            .state_metadata
            .preserved_state(restore.preserve_event())
            == Some(target)
}

/// First declared destination of `restore` that matches preserved memory.
fn restored_target(namespace: &Namespace, restore: RestoreEvent) -> Option<NamespaceState> {
    restore
        .targets()
        .find(|target| restores_to(namespace, restore, *target))
}
