//! # Namespace Lifecycle States and Events
//!
//! The transition graph for namespace lifecycle management.
//!
//! ## States
//!
//! ```text
//!                     archive
//! AncestorInherited ──────────▶ Archived
//!        ▲   │       unarchive      │
//!        │   │ ◀────────────────────┤
//!        │   │                      │
//!        │   │ schedule_deletion    │ schedule_deletion
//!        │   ▼                      ▼
//!        │  DeletionScheduled ◀─────┘
//!        │   │        ▲
//!        │   │        └──── cancel_deletion restores the state preserved
//!        │   │              by schedule_deletion (Archived | AncestorInherited)
//!        │   │ start_deletion (also from AncestorInherited / Archived
//!        │   ▼                 when swept in by an ancestor)
//!        └─ DeletionInProgress
//!              └──── reschedule_deletion restores the state preserved
//!                    by start_deletion
//! ```
//!
//! ## Preserve / Restore Pairs
//!
//! | Preserve event      | Restore event         |
//! |---------------------|-----------------------|
//! | `schedule_deletion` | `cancel_deletion`     |
//! | `start_deletion`    | `reschedule_deletion` |
//!
//! A preserve event stores the state it left under its own name in the
//! namespace's state metadata. The paired restore event reads that memory to
//! decide its destination and then clears it.
//!
//! ## Design Decision
//!
//! Namespace state lives in a database column and changes at runtime on the
//! same record, so the graph is an enum with a static rule table rather than
//! one type per state. Restore destinations are rows of [`RESTORE_TARGETS`]
//! instead of one predicate per destination.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use nsl_core::NslError;

// ─── Namespace State ─────────────────────────────────────────────────

/// The lifecycle state stored on a namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceState {
    /// No explicit override; behaves as its closest explicit ancestor,
    /// or as a normally-active namespace if there is none.
    #[default]
    AncestorInherited,
    /// Read-only archive.
    Archived,
    /// Marked for deletion; deletion has not started yet.
    DeletionScheduled,
    /// Deletion is running.
    DeletionInProgress,
}

impl NamespaceState {
    /// Every state, in declaration order.
    pub const ALL: [NamespaceState; 4] = [
        Self::AncestorInherited,
        Self::Archived,
        Self::DeletionScheduled,
        Self::DeletionInProgress,
    ];

    /// Snake-case name used in metadata, messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AncestorInherited => "ancestor_inherited",
            Self::Archived => "archived",
            Self::DeletionScheduled => "deletion_scheduled",
            Self::DeletionInProgress => "deletion_in_progress",
        }
    }

    /// Whether this state overrides inheritance from ancestors.
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Self::AncestorInherited)
    }

    /// Value stored in the `namespaces.state` column.
    ///
    /// `AncestorInherited` is stored as `NULL`. Values 3, 5 and 6 belong to
    /// host-managed states outside this machine.
    pub fn column_value(&self) -> Option<i16> {
        match self {
            Self::AncestorInherited => None,
            Self::Archived => Some(1),
            Self::DeletionScheduled => Some(2),
            Self::DeletionInProgress => Some(4),
        }
    }

    /// Decode a `namespaces.state` column value.
    pub fn from_column_value(value: Option<i16>) -> Result<Self, NslError> {
        match value {
            None => Ok(Self::AncestorInherited),
            Some(1) => Ok(Self::Archived),
            Some(2) => Ok(Self::DeletionScheduled),
            Some(4) => Ok(Self::DeletionInProgress),
            Some(other) => Err(NslError::UnknownState(other.to_string())),
        }
    }
}

impl std::fmt::Display for NamespaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamespaceState {
    type Err = NslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| NslError::UnknownState(s.to_string()))
    }
}

// ─── Events ──────────────────────────────────────────────────────────

/// An event that can be fired on a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Archive,
    Unarchive,
    ScheduleDeletion,
    CancelDeletion,
    StartDeletion,
    RescheduleDeletion,
}

/// Events that stash the state they leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreserveEvent {
    ScheduleDeletion,
    StartDeletion,
}

/// Events whose destination is read back from preserved memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreEvent {
    CancelDeletion,
    RescheduleDeletion,
}

impl LifecycleEvent {
    /// Every event, in declaration order.
    pub const ALL: [LifecycleEvent; 6] = [
        Self::Archive,
        Self::Unarchive,
        Self::ScheduleDeletion,
        Self::CancelDeletion,
        Self::StartDeletion,
        Self::RescheduleDeletion,
    ];

    /// Snake-case event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Unarchive => "unarchive",
            Self::ScheduleDeletion => "schedule_deletion",
            Self::CancelDeletion => "cancel_deletion",
            Self::StartDeletion => "start_deletion",
            Self::RescheduleDeletion => "reschedule_deletion",
        }
    }

    /// The preserve-event view of this event, if it is one.
    pub fn as_preserve(&self) -> Option<PreserveEvent> {
        match self {
            Self::ScheduleDeletion => Some(PreserveEvent::ScheduleDeletion),
            Self::StartDeletion => Some(PreserveEvent::StartDeletion),
            _ => None,
        }
    }

    /// The restore-event view of this event, if it is one.
    pub fn as_restore(&self) -> Option<RestoreEvent> {
        match self {
            Self::CancelDeletion => Some(RestoreEvent::CancelDeletion),
            Self::RescheduleDeletion => Some(RestoreEvent::RescheduleDeletion),
            _ => None,
        }
    }

    /// The transition rule declared for this event.
    pub fn rule(&self) -> TransitionRule {
        use NamespaceState::*;
        match self {
            Self::Archive => TransitionRule {
                from: &[AncestorInherited],
                to: Target::Fixed(Archived),
            },
            Self::Unarchive => TransitionRule {
                from: &[Archived],
                to: Target::Fixed(AncestorInherited),
            },
            Self::ScheduleDeletion => TransitionRule {
                from: &[AncestorInherited, Archived],
                to: Target::Fixed(DeletionScheduled),
            },
            Self::CancelDeletion => TransitionRule {
                from: &[DeletionScheduled],
                to: Target::Restored(RestoreEvent::CancelDeletion),
            },
            Self::StartDeletion => TransitionRule {
                from: &[AncestorInherited, Archived, DeletionScheduled],
                to: Target::Fixed(DeletionInProgress),
            },
            Self::RescheduleDeletion => TransitionRule {
                from: &[DeletionInProgress],
                to: Target::Restored(RestoreEvent::RescheduleDeletion),
            },
        }
    }

    /// Events that declare a rule leaving `state`.
    pub fn available_from(state: NamespaceState) -> Vec<LifecycleEvent> {
        Self::ALL
            .into_iter()
            .filter(|event| event.rule().accepts(state))
            .collect()
    }
}

impl PreserveEvent {
    /// The restore event that undoes this preserve event.
    pub fn restore_event(&self) -> RestoreEvent {
        match self {
            Self::ScheduleDeletion => RestoreEvent::CancelDeletion,
            Self::StartDeletion => RestoreEvent::RescheduleDeletion,
        }
    }

    pub fn event(&self) -> LifecycleEvent {
        match self {
            Self::ScheduleDeletion => LifecycleEvent::ScheduleDeletion,
            Self::StartDeletion => LifecycleEvent::StartDeletion,
        }
    }
}

impl RestoreEvent {
    /// The preserve event whose memory this restore event consumes.
    pub fn preserve_event(&self) -> PreserveEvent {
        match self {
            Self::CancelDeletion => PreserveEvent::ScheduleDeletion,
            Self::RescheduleDeletion => PreserveEvent::StartDeletion,
        }
    }

    pub fn event(&self) -> LifecycleEvent {
        match self {
            Self::CancelDeletion => LifecycleEvent::CancelDeletion,
            Self::RescheduleDeletion => LifecycleEvent::RescheduleDeletion,
        }
    }

    /// Destinations this restore event may resolve to, in evaluation order.
    pub fn targets(&self) -> impl Iterator<Item = NamespaceState> + '_ {
        RESTORE_TARGETS
            .iter()
            .filter(move |(event, _)| event == self)
            .map(|(_, target)| *target)
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for PreserveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event().as_str())
    }
}

impl std::fmt::Display for RestoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event().as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = NslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| NslError::Validation(format!("unknown lifecycle event: {s:?}")))
    }
}

// ─── Transition Rules ────────────────────────────────────────────────

/// Where a transition lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Always the same state.
    Fixed(NamespaceState),
    /// Whatever the paired preserve event remembered.
    Restored(RestoreEvent),
}

/// The single guarded rule an event declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// States the event may leave.
    pub from: &'static [NamespaceState],
    /// Destination.
    pub to: Target,
}

impl TransitionRule {
    /// Whether the rule can fire from `state`.
    pub fn accepts(&self, state: NamespaceState) -> bool {
        self.from.contains(&state)
    }
}

/// Restore destinations as `(restore_event, target_state)` rows.
///
/// For a restore event, rows are tried in order; the first whose target
/// equals the state preserved under the paired preserve event wins.
pub const RESTORE_TARGETS: &[(RestoreEvent, NamespaceState)] = &[
    (RestoreEvent::CancelDeletion, NamespaceState::Archived),
    (RestoreEvent::CancelDeletion, NamespaceState::AncestorInherited),
    (RestoreEvent::RescheduleDeletion, NamespaceState::Archived),
    (RestoreEvent::RescheduleDeletion, NamespaceState::AncestorInherited),
    (RestoreEvent::RescheduleDeletion, NamespaceState::DeletionScheduled),
];

// ─── Tests ───────────────────────────────────────────────────────────
