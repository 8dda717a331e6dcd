//! # Scenario Files
//!
//! A scenario seeds a namespace tree and lists events to fire against it.
//! Namespaces are listed parent first; `state` defaults to
//! `ancestor_inherited`.
//!
//! ```yaml
//! namespaces:
//!   - id: 1
//!     state: archived
//!   - id: 2
//!     parent_id: 1
//! steps:
//!   - namespace: 2
//!     event: schedule_deletion
//!     user_id: 7
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nsl_core::{CorrelationId, NamespaceId, UserId};
use nsl_state::{
    InMemoryNamespaceStore, LifecycleEvent, NamespaceState, StoreError, TransitionContext,
};

/// Errors raised while loading a scenario or seeding its tree.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to seed namespace {id}: {source}")]
    Seed {
        id: NamespaceId,
        #[source]
        source: StoreError,
    },
}

/// A namespace to create before any step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceSeed {
    pub id: NamespaceId,
    #[serde(default)]
    pub parent_id: Option<NamespaceId>,
    #[serde(default)]
    pub state: NamespaceState,
}

/// One event to fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub namespace: NamespaceId,
    pub event: LifecycleEvent,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
}

impl Step {
    pub fn context(&self) -> TransitionContext {
        TransitionContext {
            transition_user: self.user_id,
            correlation_id: self.correlation_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub namespaces: Vec<NamespaceSeed>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Create every seeded namespace in a fresh in-memory store.
    pub fn build_store(&self) -> Result<InMemoryNamespaceStore, ScenarioError> {
        let store = InMemoryNamespaceStore::new();
        for seed in &self.namespaces {
            let created = match seed.parent_id {
                None => store.create_root(seed.id, seed.state),
                Some(parent_id) => store.create_child(parent_id, seed.id, seed.state),
            };
            created.map_err(|source| ScenarioError::Seed {
                id: seed.id,
                source,
            })?;
        }
        tracing::debug!(namespaces = self.namespaces.len(), "seeded scenario tree");
        Ok(store)
    }
}
