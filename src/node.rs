use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub use serde_yaml::{Mapping, Value};

/// Arena slot of a node inside a [`crate::Tree`]. Slots are recycled; the
/// generation tells a live node from a released one at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Scalar,
    Mapping,
    Sequence,
}

impl NodeType {
    pub fn is_container(self) -> bool {
        !matches!(self, NodeType::Scalar)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Scalar => f.write_str("scalar"),
            NodeType::Mapping => f.write_str("mapping"),
            NodeType::Sequence => f.write_str("sequence"),
        }
    }
}

/// Decides which node kind wraps a raw value.
///
/// Strings are scalars even though they are iterable; tagged values are
/// opaque scalars too.
pub fn classify(value: &Value) -> NodeType {
    match value {
        Value::Mapping(_) => NodeType::Mapping,
        Value::Sequence(_) => NodeType::Sequence,
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null | Value::Tagged(_) => {
            NodeType::Scalar
        }
    }
}

/// Child cache of a mapping node, in the key order of the backing mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Children {
    entries: Vec<(Value, NodeId)>,
    positions: HashMap<Value, usize>,
}

impl Children {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn as_slice(&self) -> &[(Value, NodeId)] {
        &self.entries
    }

    pub(crate) fn get(&self, key: &Value) -> Option<NodeId> {
        let position = *self.positions.get(key)?;
        self.entries.get(position).map(|(_, id)| *id)
    }

    pub(crate) fn contains_key(&self, key: &Value) -> bool {
        self.positions.contains_key(key)
    }

    pub(crate) fn key_of(&self, id: NodeId) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(_, child)| *child == id)
            .map(|(k, _)| k)
    }

    /// Replaces in place when the key exists, appends otherwise. Returns
    /// the displaced child.
    pub(crate) fn insert(&mut self, key: Value, id: NodeId) -> Option<NodeId> {
        match self.positions.get(&key) {
            Some(&position) => self
                .entries
                .get_mut(position)
                .map(|entry| std::mem::replace(&mut entry.1, id)),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, id));
                None
            }
        }
    }

    pub(crate) fn shift_remove(&mut self, key: &Value) -> Option<NodeId> {
        let position = self.positions.remove(key)?;
        if position >= self.entries.len() {
            return None;
        }
        let (_, id) = self.entries.remove(position);
        for (k, _) in &self.entries[position..] {
            if let Some(p) = self.positions.get_mut(k) {
                *p -= 1;
            }
        }
        Some(id)
    }
}

impl FromIterator<(Value, NodeId)> for Children {
    fn from_iter<I: IntoIterator<Item = (Value, NodeId)>>(iter: I) -> Self {
        let mut children = Children::default();
        for (key, id) in iter {
            children.insert(key, id);
        }
        children
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Scalar(Value),
    Mapping(Children),
    Sequence(Vec<NodeId>),
}

impl NodeKind {
    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Scalar(_) => NodeType::Scalar,
            NodeKind::Mapping(_) => NodeType::Mapping,
            NodeKind::Sequence(_) => NodeType::Sequence,
        }
    }

    pub(crate) fn child_ids(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Scalar(_) => Vec::new(),
            NodeKind::Mapping(children) => children.as_slice().iter().map(|(_, id)| *id).collect(),
            NodeKind::Sequence(children) => children.clone(),
        }
    }

    pub(crate) fn child_at(&self, position: usize) -> Option<NodeId> {
        match self {
            NodeKind::Scalar(_) => None,
            NodeKind::Mapping(children) => children.as_slice().get(position).map(|(_, id)| *id),
            NodeKind::Sequence(children) => children.get(position).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) kind: NodeKind,
    pub(crate) extras: BTreeMap<String, Value>,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeId>, depth: usize, kind: NodeKind) -> Self {
        Self {
            parent,
            depth,
            kind,
            extras: BTreeMap::new(),
        }
    }
}

pub(crate) fn describe_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}
