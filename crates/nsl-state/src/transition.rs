//! # Transitions
//!
//! Value types describing a single transition attempt: who asked for it,
//! which edge of the graph it targets, and the record kept once it commits.

use serde::{Deserialize, Serialize};

use nsl_core::{CorrelationId, NamespaceId, Timestamp, UserId};

use crate::lifecycle::{LifecycleEvent, NamespaceState};

/// Caller-supplied context for firing an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionContext {
    /// The acting user. Transitions without one are rejected.
    pub transition_user: Option<UserId>,
    /// Request correlation id; generated when absent.
    pub correlation_id: Option<CorrelationId>,
}

impl TransitionContext {
    /// Context for a change made by `user`.
    pub fn by(user: UserId) -> Self {
        Self {
            transition_user: Some(user),
            correlation_id: None,
        }
    }

    /// Context with no acting user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

/// One attempted edge of the graph.
///
/// For rejected attempts whose destination could not be determined, `to`
/// equals `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub event: LifecycleEvent,
    pub from: NamespaceState,
    pub to: NamespaceState,
    pub user_id: Option<UserId>,
    pub correlation_id: CorrelationId,
}

/// Record of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub namespace_id: NamespaceId,
    pub event: LifecycleEvent,
    pub from_state: NamespaceState,
    pub to_state: NamespaceState,
    pub user_id: Option<UserId>,
    pub correlation_id: CorrelationId,
    pub timestamp: Timestamp,
}
