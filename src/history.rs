use crate::config::HistoryConfig;
use crate::error::MetatreeError;
use crate::node::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub script: String,
    pub revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
}

impl HistoryEntry {
    pub fn new(config: &HistoryConfig, source: Option<&Path>) -> Self {
        Self {
            timestamp: Utc::now(),
            script: config.script.clone().unwrap_or_else(current_script),
            revision: config
                .revision
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            source: source.map(|p| p.display().to_string()),
            description: config.description.clone(),
        }
    }
}

pub fn current_script() -> String {
    std::env::args()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn stamp(
    raw: &Value,
    config: &HistoryConfig,
    source: Option<&Path>,
) -> Result<Value, MetatreeError> {
    append(raw, &config.key, &HistoryEntry::new(config, source))
}

/// A missing key starts a new list. A document whose root is not a mapping
/// is returned unchanged.
pub fn append(raw: &Value, key: &str, entry: &HistoryEntry) -> Result<Value, MetatreeError> {
    let mut copy = raw.clone();
    let Value::Mapping(root) = &mut copy else {
        tracing::warn!(key, "document root is not a mapping, history not recorded");
        return Ok(copy);
    };

    let record = serde_yaml::to_value(entry)?;
    let history_key = Value::String(key.to_string());
    match root.get_mut(&history_key) {
        Some(Value::Sequence(entries)) => entries.push(record),
        Some(_) => {
            return Err(MetatreeError::Invariant(format!(
                "history key '{}' does not hold a list",
                key
            )));
        }
        None => {
            root.insert(history_key, Value::Sequence(vec![record]));
        }
    }

    tracing::debug!(key, script = %entry.script, revision = %entry.revision, "history entry appended");
    Ok(copy)
}
