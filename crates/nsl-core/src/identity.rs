//! # Identity Newtypes
//!
//! Namespaces and users are both keyed by integer row ids in the host
//! database. Wrapping them keeps the two apart at compile time: an
//! ancestor id can never be recorded as the acting user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a namespace (group, project namespace, user namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(pub i64);

/// Unique identifier of the user that triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Request correlation id attached to a transition attempt.
///
/// Supplied by the caller when a request id already exists, otherwise
/// generated so that every metadata write and log record can be tied back
/// to a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl NamespaceId {
    /// Access the raw row id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl UserId {
    /// Access the raw row id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl CorrelationId {
    /// Wrap an existing correlation id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random correlation id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
