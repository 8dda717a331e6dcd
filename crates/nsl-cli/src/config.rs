//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`. Every field has a default, so
//! an empty file (or no file) is valid.
//!
//! ```yaml
//! log_format: json
//! log_filter: "nsl_state=debug"
//! pretty_output: false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides every other log filter source.
pub const LOG_ENV_VAR: &str = "NSL_LOG";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings loaded from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when neither `NSL_LOG` nor `-v` is given.
    pub log_filter: Option<String>,
    /// Indent JSON reports.
    pub pretty_output: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: None,
            pretty_output: true,
        }
    }
}

impl CliConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// The filter directive to install.
    ///
    /// Precedence: `env_override` (from `NSL_LOG`), then `-v` repetitions,
    /// then `log_filter`, then `warn`.
    pub fn filter_directive(&self, env_override: Option<String>, verbose: u8) -> String {
        if let Some(directive) = env_override.filter(|d| !d.trim().is_empty()) {
            return directive;
        }
        match verbose {
            0 => self
                .log_filter
                .clone()
                .unwrap_or_else(|| "warn".to_string()),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}
