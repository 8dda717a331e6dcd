//! # nsl-cli: Namespace Lifecycle CLI
//!
//! Provides the `nsl` command-line interface for exercising the lifecycle
//! state machine against a scenario tree held in memory.
//!
//! ## Subcommands
//!
//! - `nsl replay`: Fire a scenario's steps and report every outcome.
//! - `nsl inspect`: Show one namespace's own and effective state.
//!
//! ```bash
//! nsl replay demos/schedule_then_cancel.yaml
//! nsl -v --log-format json replay demos/ancestor_blocks_archive.yaml --fail-on-reject
//! nsl inspect demos/ancestor_blocks_archive.yaml 11
//! ```

pub mod config;
pub mod replay;
pub mod scenario;

pub use config::{CliConfig, LogFormat};
pub use scenario::{Scenario, ScenarioError};
