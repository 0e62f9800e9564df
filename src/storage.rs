use crate::config::HistoryConfig;
use crate::error::MetatreeError;
use crate::history;
use crate::node::Value;
use crate::tree::{Tree, build_tree};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const FILENAME_ATTR: &str = "_filename";
pub const PATH_ATTR: &str = "_path";

pub fn from_yaml_str(yaml: &str) -> Result<Tree, MetatreeError> {
    let raw: Value = serde_yaml::from_str(yaml)?;
    build_tree(raw)
}

pub fn to_yaml_string(tree: &Tree) -> Result<String, MetatreeError> {
    Ok(serde_yaml::to_string(tree.backing())?)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Tree> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut tree = from_yaml_str(&data)
        .with_context(|| format!("Failed to parse metadata: {}", path.display()))?;

    let root = tree.root_id();
    if let Some(name) = path.file_name() {
        tree.set_extra(root, FILENAME_ATTR, name.to_string_lossy().into_owned())?;
    }
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    tree.set_extra(root, PATH_ATTR, dir)?;

    tracing::debug!(path = %path.display(), "loaded metadata");
    Ok(tree)
}

/// Writes the tree as YAML. History is stamped on a copy of the backing
/// value; `tree` itself is left untouched.
pub fn save<P: AsRef<Path>>(path: P, tree: &Tree, config: &HistoryConfig) -> Result<()> {
    let path = path.as_ref();
    let raw = if config.enabled {
        let source = origin(tree);
        history::stamp(tree.backing(), config, source.as_deref())?
    } else {
        tree.backing().clone()
    };

    let data = serde_yaml::to_string(&raw)?;
    fs::write(path, data).with_context(|| format!("Failed to write to file: {}", path.display()))?;

    tracing::info!(path = %path.display(), history = config.enabled, "saved metadata");
    Ok(())
}

pub fn exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

pub fn origin(tree: &Tree) -> Option<PathBuf> {
    let root = tree.root();
    let name = root.extra(FILENAME_ATTR).and_then(Value::as_str)?;
    let dir = root.extra(PATH_ATTR).and_then(Value::as_str).unwrap_or("");
    Some(Path::new(dir).join(name))
}
