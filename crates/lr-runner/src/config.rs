//! Runner configuration loaded from TOML or built programmatically.
//!
//! ```toml
//! name_matching = "exact_then_substring"
//! reuse_buffers = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binder::NameMatching;
use crate::error::{Result, RunnerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// How named inputs are matched to slots.
    pub name_matching: NameMatching,
    /// Keep input buffers between calls while shapes are unchanged.
    pub reuse_buffers: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name_matching: NameMatching::Substring,
            reuse_buffers: true,
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RunnerError::Config(format!("cannot read config '{}': {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| RunnerError::Config(format!("TOML parse error: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RunnerError::Config(format!("TOML serialise error: {e}")))
    }
}
