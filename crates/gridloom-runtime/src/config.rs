//! Tunables for design-mode sessions.
//!
//! [`DesignConfig`] can be built in code or loaded from TOML or JSON at
//! startup (feature `config`, on by default):
//!
//! ```toml
//! # gridloom.toml
//! hover_delay_ms = 150
//! history_max_depth = 50
//! id_prefix = "app"
//! ```
//!
//! Missing fields keep their defaults.

#[cfg(feature = "config")]
use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::Duration;

use gridloom_layout::DEFAULT_ID_PREFIX;

/// Longest accepted hover debounce.
pub const MAX_HOVER_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Debounce before a hovered placeholder receives a tentative drop.
    pub hover_delay_ms: u64,

    /// Snapshots kept in each session's history; the oldest are evicted
    /// first. `0` keeps everything.
    pub history_max_depth: usize,

    /// Prefix of the ids assigned to new nodes.
    pub id_prefix: String,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            hover_delay_ms: 200,
            history_max_depth: 100,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

impl DesignConfig {
    #[must_use]
    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    /// Problems with the current values; empty when the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.hover_delay_ms > MAX_HOVER_DELAY_MS {
            errors.push(format!(
                "hover_delay_ms must be at most {MAX_HOVER_DELAY_MS}, got {}",
                self.hover_delay_ms
            ));
        }
        if self.id_prefix.is_empty() {
            errors.push("id_prefix must not be empty".to_string());
        } else if !self
            .id_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(format!(
                "id_prefix may only hold ASCII letters, digits, '-' and '_', got {:?}",
                self.id_prefix
            ));
        }
        errors
    }

    #[cfg(feature = "config")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .checked()
    }

    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .checked()
    }

    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
