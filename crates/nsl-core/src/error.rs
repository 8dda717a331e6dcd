//! # Error Types
//!
//! Shared error type for the primitives in this crate. Domain crates define
//! their own `thiserror` enums and wrap `NslError` where a primitive fails
//! to parse.

use thiserror::Error;

/// Top-level error type for namespace lifecycle primitives.
#[derive(Error, Debug)]
pub enum NslError {
    /// A value failed validation while being parsed or constructed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A stored state value does not map to a known lifecycle state.
    #[error("unknown state value: {0}")]
    UnknownState(String),
}
