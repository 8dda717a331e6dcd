//! # nsl-state: Hierarchical Namespace Lifecycle
//!
//! Every namespace in a tree sits in one of four lifecycle states. A
//! namespace in `ancestor_inherited` behaves as its closest ancestor that
//! holds an explicit state.
//!
//! ## Components
//!
//! - **Lifecycle** (`lifecycle.rs`): states, events and the static
//!   transition table, including which events preserve and restore state.
//!
//! - **Memory** (`memory.rs`): remembers the state a namespace left when a
//!   preserve event fired, so the paired restore event can return to it.
//!
//! - **Guards** (`guard.rs`): actor requirement and ancestor-state checks.
//!
//! - **Resolver** (`resolver.rs`): effective state in one bulk ancestor read.
//!
//! - **Audit** (`audit.rs`): metadata bookkeeping and structured logs for
//!   every attempt, committed or not.
//!
//! - **Machine** (`machine.rs`): fires events, wiring the pieces above
//!   around a single persisted write.
//!
//! - **Store** (`store.rs`): the persistence boundary and an in-memory
//!   implementation.
//!
//! ## Design
//!
//! States are runtime values because they are persisted and read back from
//! storage. The transition table is static data, and all of its edges are
//! checked in one place before any guard runs.

pub mod audit;
pub mod guard;
pub mod lifecycle;
pub mod machine;
pub mod memory;
pub mod metadata;
pub mod namespace;
pub mod resolver;
pub mod store;
pub mod transition;

// ─── Lifecycle re-exports ───────────────────────────────────────────

pub use lifecycle::{
    LifecycleEvent, NamespaceState, PreserveEvent, RestoreEvent, Target, TransitionRule,
    RESTORE_TARGETS,
};

// ─── Namespace re-exports ───────────────────────────────────────────

pub use metadata::StateMetadata;
pub use namespace::{Namespace, ValidationErrors, STATE_ATTRIBUTE};

// ─── Machine re-exports ─────────────────────────────────────────────

pub use machine::{restores_to, LifecycleError, LifecycleStateMachine, TransitionOutcome};
pub use transition::{Transition, TransitionContext, TransitionRecord};

// ─── Component re-exports ───────────────────────────────────────────

pub use audit::TransitionAuditor;
pub use guard::TransitionGuard;
pub use memory::StateMemoryStore;
pub use resolver::EffectiveStateResolver;

// ─── Store re-exports ───────────────────────────────────────────────

pub use store::{InMemoryNamespaceStore, NamespaceStore, StoreError};
