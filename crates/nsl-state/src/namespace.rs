//! # Namespace Record
//!
//! The fields of a namespace row that the lifecycle machine reads and
//! writes, plus the per-record validation error collection that guard
//! rejections are reported through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nsl_core::NamespaceId;

use crate::lifecycle::NamespaceState;
use crate::metadata::StateMetadata;

/// Attribute name lifecycle validation errors are attached to.
pub const STATE_ATTRIBUTE: &str = "state";

// ─── Validation Errors ───────────────────────────────────────────────

/// Validation messages keyed by attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, attribute: &'static str, message: impl Into<String>) {
        self.messages.entry(attribute).or_default().push(message.into());
    }

    /// Messages attached to `attribute`, oldest first.
    pub fn on(&self, attribute: &str) -> &[String] {
        self.messages.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.values().all(Vec::is_empty)
    }
}

// ─── Namespace ───────────────────────────────────────────────────────

/// A namespace as seen by the lifecycle machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    /// Immediate ancestor; `None` for roots.
    pub parent_id: Option<NamespaceId>,
    /// Ancestor ids from the root down to and including `id`.
    pub traversal_ids: Vec<NamespaceId>,
    /// Own lifecycle state. Mutated only through transitions.
    #[serde(default)]
    pub state: NamespaceState,
    #[serde(default)]
    pub state_metadata: StateMetadata,
    /// Errors from the most recent transition attempt. Never persisted.
    #[serde(skip)]
    pub errors: ValidationErrors,
}

impl Namespace {
    /// A top-level namespace.
    pub fn root(id: NamespaceId) -> Self {
        Self {
            id,
            parent_id: None,
            traversal_ids: vec![id],
            state: NamespaceState::AncestorInherited,
            state_metadata: StateMetadata::default(),
            errors: ValidationErrors::default(),
        }
    }

    /// A namespace nested directly under `parent`.
    pub fn child_of(parent: &Namespace, id: NamespaceId) -> Self {
        let mut traversal_ids = parent.traversal_ids.clone();
        traversal_ids.push(id);
        Self {
            id,
            parent_id: Some(parent.id),
            traversal_ids,
            state: NamespaceState::AncestorInherited,
            state_metadata: StateMetadata::default(),
            errors: ValidationErrors::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Ancestor ids ordered root first, excluding self.
    pub fn ancestor_ids(&self) -> &[NamespaceId] {
        match self.traversal_ids.split_last() {
            Some((_, ancestors)) => ancestors,
            None => &[],
        }
    }

    /// Whether `traversal_ids` ends with `id` and agrees with `parent_id`.
    pub fn has_consistent_ancestry(&self) -> bool {
        if self.traversal_ids.last() != Some(&self.id) {
            return false;
        }
        self.ancestor_ids().last().copied() == self.parent_id
    }

    /// Validation messages on the `state` attribute.
    pub fn state_errors(&self) -> &[String] {
        self.errors.on(STATE_ATTRIBUTE)
    }
}
