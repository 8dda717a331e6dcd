//! # Transition Auditing
//!
//! Records every transition attempt in the namespace's state metadata and
//! in the structured log, whether or not it committed.
//!
//! On failure the metadata is written immediately through
//! [`NamespaceStore::save_metadata`], because a rejected transition
//! otherwise persists nothing. A failure of that write propagates and the
//! caller's metadata is left as it was.

use nsl_core::Timestamp;

use crate::lifecycle::LifecycleEvent;
use crate::metadata::StateMetadata;
use crate::namespace::Namespace;
use crate::store::{NamespaceStore, StoreError};
use crate::transition::Transition;

/// Reason used when a transition failed without any recorded error.
pub const UNKNOWN_REASON: &str = "unknown reason";

/// Writes the audit trail for transition attempts.
pub struct TransitionAuditor<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: NamespaceStore + ?Sized> TransitionAuditor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Merge the audit fields of a committed transition into metadata.
    ///
    /// Persisting is left to the caller, which writes state and metadata
    /// together.
    pub fn record_success(&self, namespace: &mut Namespace, transition: &Transition) {
        let now = Timestamp::now();
        let metadata = &mut namespace.state_metadata;
        merge_attempt(metadata, transition, now, None);

        match transition.event {
            LifecycleEvent::ScheduleDeletion => {
                metadata.deletion_scheduled_at = Some(now);
                metadata.deletion_scheduled_by_user_id = transition.user_id;
            }
            LifecycleEvent::CancelDeletion => {
                metadata.deletion_scheduled_at = None;
                metadata.deletion_scheduled_by_user_id = None;
            }
            _ => {}
        }
    }

    /// Log a committed transition.
    pub fn log_success(&self, namespace: &Namespace, transition: &Transition) {
        tracing::info!(
            namespace_id = namespace.id.get(),
            from_state = %transition.from,
            to_state = %transition.to,
            event = %transition.event,
            user_id = transition.user_id.map(|u| u.get()),
            correlation_id = %transition.correlation_id,
            "Namespace state transition"
        );
    }

    /// Record a rejected transition: merge the failure into metadata,
    /// persist it, and log it. Returns the composed error message.
    pub fn record_failure(
        &self,
        namespace: &mut Namespace,
        transition: &Transition,
    ) -> Result<String, StoreError> {
        let error = failure_message(namespace, transition);
        let mut metadata = namespace.state_metadata.clone();
        merge_attempt(&mut metadata, transition, Timestamp::now(), Some(error.clone()));
        self.store.save_metadata(namespace.id, &metadata)?;
        namespace.state_metadata = metadata;

        tracing::error!(
            namespace_id = namespace.id.get(),
            event = %transition.event,
            current_state = %namespace.state,
            error = %error,
            user_id = transition.user_id.map(|u| u.get()),
            correlation_id = %transition.correlation_id,
            "Namespace state transition failed"
        );
        Ok(error)
    }
}

/// `"Cannot transition from <from> to <to> via <event>: <reasons>"`.
pub fn failure_message(namespace: &Namespace, transition: &Transition) -> String {
    let errors = namespace.state_errors();
    let reasons = if errors.is_empty() {
        UNKNOWN_REASON.to_string()
    } else {
        errors.join(", ")
    };
    format!(
        "Cannot transition from {} to {} via {}: {}",
        transition.from, transition.to, transition.event, reasons
    )
}

fn merge_attempt(
    metadata: &mut StateMetadata,
    transition: &Transition,
    now: Timestamp,
    error: Option<String>,
) {
    metadata.last_updated_at = Some(now);
    metadata.last_error = error;
    metadata.last_changed_by_user_id = transition.user_id;
    metadata.correlation_id = Some(transition.correlation_id.clone());
}
