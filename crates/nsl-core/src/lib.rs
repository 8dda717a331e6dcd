//! # nsl-core: Foundational Types for Namespace Lifecycle
//!
//! The leaf crate of the workspace. It defines the primitives every other
//! crate shares: identifier newtypes, the UTC-only `Timestamp`, request
//! correlation ids, and the top-level error type.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `NamespaceId` and `UserId` are
//!    distinct types. A user id cannot be passed where a namespace id is
//!    expected.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is always UTC with seconds
//!    precision, so metadata written at different call sites renders
//!    identically (`YYYY-MM-DDTHH:MM:SSZ`).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nsl-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::NslError;
pub use identity::{CorrelationId, NamespaceId, UserId};
pub use temporal::Timestamp;
