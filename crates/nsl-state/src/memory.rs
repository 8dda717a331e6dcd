//! # Preserved-State Memory
//!
//! Remembers the state a namespace was in before a preserve event fired,
//! keyed by that preserve event, so the paired restore event can return to
//! it without hard-coding a previous state.

use crate::lifecycle::{LifecycleEvent, NamespaceState, PreserveEvent};
use crate::metadata::StateMetadata;

/// Read/write view over the `preserved_states` map of a metadata document.
#[derive(Debug)]
pub struct StateMemoryStore<'a> {
    metadata: &'a mut StateMetadata,
}

impl<'a> StateMemoryStore<'a> {
    pub fn new(metadata: &'a mut StateMetadata) -> Self {
        Self { metadata }
    }

    /// Remember `state` under `event`. Last write wins.
    pub fn save(&mut self, event: PreserveEvent, state: NamespaceState) {
        self.metadata.preserved_states.insert(event, state);
    }

    /// Forget whatever `event` preserved. Returns whether anything was removed.
    ///
    /// The map itself is omitted from the serialized document once empty.
    pub fn clear(&mut self, event: PreserveEvent) -> bool {
        self.metadata.preserved_states.remove(&event).is_some()
    }

    pub fn read(&self, event: PreserveEvent) -> Option<NamespaceState> {
        self.metadata.preserved_state(event)
    }
}

/// The preserve event whose memory `restore_event` consumes.
///
/// `None` when `restore_event` is not a restore event.
pub fn preserve_event_for(restore_event: LifecycleEvent) -> Option<PreserveEvent> {
    restore_event
        .as_restore()
        .map(|restore| restore.preserve_event())
}
