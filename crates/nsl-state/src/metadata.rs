//! # State Metadata
//!
//! The durable side-channel stored next to a namespace's `state` column.
//! It carries preserved states for outstanding preserve events and the
//! audit trail of the latest transition attempt.
//!
//! Every field is optional and absent keys are omitted on serialization,
//! so an untouched namespace serializes as `{}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nsl_core::{CorrelationId, Timestamp, UserId};

use crate::lifecycle::{NamespaceState, PreserveEvent};

/// Typed form of a namespace's `state_metadata` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMetadata {
    /// State each outstanding preserve event left, keyed by that event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preserved_states: BTreeMap<PreserveEvent, NamespaceState>,

    /// When the last transition attempt was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<Timestamp>,

    /// Failure message of the last attempt; absent after a success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_by_user_id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,

    /// Set only while a deletion is scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_scheduled_at: Option<Timestamp>,

    /// Set only while a deletion is scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_scheduled_by_user_id: Option<UserId>,
}

impl StateMetadata {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The state preserved under `event`, if any.
    pub fn preserved_state(&self, event: PreserveEvent) -> Option<NamespaceState> {
        self.preserved_states.get(&event).copied()
    }
}
