//! # Namespace Persistence Boundary
//!
//! The lifecycle machine never talks to a database directly. It reads and
//! writes namespaces through [`NamespaceStore`], which a host implements
//! over its own tables.
//!
//! Ancestor lookups go through [`NamespaceStore::states_of`], a single bulk
//! read over ids already known from `traversal_ids`. Callers never walk the
//! tree one parent at a time.
//!
//! [`InMemoryNamespaceStore`] backs tests and the CLI.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use nsl_core::NamespaceId;

use crate::lifecycle::NamespaceState;
use crate::metadata::StateMetadata;
use crate::namespace::Namespace;

/// Errors raised at the persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("namespace {0} not found")]
    NotFound(NamespaceId),

    #[error("namespace {0} already exists")]
    AlreadyExists(NamespaceId),

    /// `traversal_ids` does not agree with `parent_id`.
    #[error("namespace {0} has inconsistent ancestry")]
    InconsistentAncestry(NamespaceId),

    /// The backend refused or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage operations the lifecycle machine depends on.
///
/// Implementations serialize writes per namespace; the machine does no
/// locking of its own.
pub trait NamespaceStore {
    /// Load a namespace by id.
    fn find(&self, id: NamespaceId) -> Result<Namespace, StoreError>;

    /// Own states of the given namespaces in one round-trip.
    ///
    /// Ids that do not exist are omitted. Result order is unspecified.
    fn states_of(
        &self,
        ids: &[NamespaceId],
    ) -> Result<Vec<(NamespaceId, NamespaceState)>, StoreError>;

    /// Persist `state` and `state_metadata` together.
    fn save(&self, namespace: &Namespace) -> Result<(), StoreError>;

    /// Persist only `state_metadata`, leaving `state` untouched.
    fn save_metadata(&self, id: NamespaceId, metadata: &StateMetadata) -> Result<(), StoreError>;
}

impl<T: NamespaceStore + ?Sized> NamespaceStore for &T {
    fn find(&self, id: NamespaceId) -> Result<Namespace, StoreError> {
        (**self).find(id)
    }

    fn states_of(
        &self,
        ids: &[NamespaceId],
    ) -> Result<Vec<(NamespaceId, NamespaceState)>, StoreError> {
        (**self).states_of(ids)
    }

    fn save(&self, namespace: &Namespace) -> Result<(), StoreError> {
        (**self).save(namespace)
    }

    fn save_metadata(&self, id: NamespaceId, metadata: &StateMetadata) -> Result<(), StoreError> {
        (**self).save_metadata(id, metadata)
    }
}

// ─── In-Memory Store ─────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory namespace table.
///
/// Counts read round-trips so callers can check that tree lookups stay
/// bulk, and can be told to fail reads or writes to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNamespaceStore {
    rows: Arc<RwLock<HashMap<NamespaceId, Namespace>>>,
    round_trips: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryNamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new namespace.
    pub fn insert(&self, namespace: Namespace) -> Result<Namespace, StoreError> {
        if !namespace.has_consistent_ancestry() {
            return Err(StoreError::InconsistentAncestry(namespace.id));
        }
        let mut rows = self.rows.write();
        if rows.contains_key(&namespace.id) {
            return Err(StoreError::AlreadyExists(namespace.id));
        }
        if let Some(parent_id) = namespace.parent_id {
            let parent = rows.get(&parent_id).ok_or(StoreError::NotFound(parent_id))?;
            if parent.traversal_ids[..] != namespace.ancestor_ids()[..] {
                return Err(StoreError::InconsistentAncestry(namespace.id));
            }
        }
        rows.insert(namespace.id, namespace.clone());
        Ok(namespace)
    }

    /// Create a top-level namespace in `state`.
    pub fn create_root(
        &self,
        id: NamespaceId,
        state: NamespaceState,
    ) -> Result<Namespace, StoreError> {
        let mut namespace = Namespace::root(id);
        namespace.state = state;
        self.insert(namespace)
    }

    /// Create a namespace under `parent_id` in `state`.
    pub fn create_child(
        &self,
        parent_id: NamespaceId,
        id: NamespaceId,
        state: NamespaceState,
    ) -> Result<Namespace, StoreError> {
        let parent = self
            .rows
            .read()
            .get(&parent_id)
            .cloned()
            .ok_or(StoreError::NotFound(parent_id))?;
        let mut namespace = Namespace::child_of(&parent, id);
        namespace.state = state;
        self.insert(namespace)
    }

    /// Overwrite a stored state without running a transition.
    ///
    /// For seeding fixtures and backfills only.
    pub fn set_state(&self, id: NamespaceId, state: NamespaceState) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.state = state;
        Ok(())
    }

    /// Number of read round-trips served so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn reset_round_trips(&self) {
        self.round_trips.store(0, Ordering::SeqCst);
    }

    /// Make every subsequent `find` and `states_of` fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All stored namespaces, ordered by id.
    pub fn list(&self) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = self.rows.read().values().cloned().collect();
        namespaces.sort_by_key(|ns| ns.id);
        namespaces
    }

    fn check_readable(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("reads are disabled".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes are disabled".to_string()));
        }
        Ok(())
    }
}

impl NamespaceStore for InMemoryNamespaceStore {
    fn find(&self, id: NamespaceId) -> Result<Namespace, StoreError> {
        self.check_readable()?;
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.rows.read().get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn states_of(
        &self,
        ids: &[NamespaceId],
    ) -> Result<Vec<(NamespaceId, NamespaceState)>, StoreError> {
        self.check_readable()?;
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read();
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|row| (row.id, row.state)))
            .collect())
    }

    fn save(&self, namespace: &Namespace) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(&namespace.id)
            .ok_or(StoreError::NotFound(namespace.id))?;
        row.state = namespace.state;
        row.state_metadata = namespace.state_metadata.clone();
        Ok(())
    }

    fn save_metadata(&self, id: NamespaceId, metadata: &StateMetadata) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.rows.write();
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.state_metadata = metadata.clone();
        Ok(())
    }
}
