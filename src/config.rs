//! Settings for history stamping on save.
//!
//! Can be written inline or kept next to the metadata as a small YAML file:
//!
//! ```yaml
//! revision: v1.4.2
//! description:
//!   - re-processed with new calibration
//! ```

use crate::error::MetatreeError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_HISTORY_KEY: &str = "$history";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default)]
    pub script: Option<String>,

    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub description: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_key() -> String {
    DEFAULT_HISTORY_KEY.to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            key: default_key(),
            script: None,
            revision: None,
            description: Vec::new(),
        }
    }
}

impl HistoryConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_description(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history config: {}", path.display()))?;
        Ok(Self::from_yaml(&content)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, MetatreeError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
