use crate::error::MetatreeError;
use crate::node::{Node, NodeId, NodeKind, NodeType, Value, describe_key};
use crate::query::Query;
use crate::selector::Selector;
use crate::tree::Tree;
use std::fmt;

#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
    node: &'t Node,
}

/// Result of a keyed or positional read.
///
/// Scalar children are unwrapped to their value; mapping and sequence
/// children come back as live nodes.
#[derive(Debug, Clone, Copy)]
pub enum Item<'t> {
    Scalar(&'t Value),
    Node(NodeRef<'t>),
}

impl<'t> Item<'t> {
    pub fn as_scalar(&self) -> Option<&'t Value> {
        match *self {
            Item::Scalar(v) => Some(v),
            Item::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'t>> {
        match *self {
            Item::Scalar(_) => None,
            Item::Node(n) => Some(n),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn as_str(&self) -> Option<&'t str> {
        self.as_scalar().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_scalar().and_then(Value::as_u64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    pub fn is_null(&self) -> bool {
        self.as_scalar().is_some_and(Value::is_null)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Item::Scalar(v) => (*v).clone(),
            Item::Node(n) => n.to_value(),
        }
    }
}

impl PartialEq<Value> for Item<'_> {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Item::Scalar(v) => *v == other,
            Item::Node(n) => n.to_value() == *other,
        }
    }
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId, node: &'t Node) -> Self {
        Self { tree, id, node }
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t Tree {
        self.tree
    }

    pub fn depth(self) -> usize {
        self.node.depth
    }

    pub fn node_type(self) -> NodeType {
        self.node.kind.node_type()
    }

    pub fn parent(self) -> Option<NodeRef<'t>> {
        self.node.parent.and_then(|p| self.tree.node(p).ok())
    }

    pub fn is_root(self) -> bool {
        self.node.parent.is_none()
    }

    pub fn len(self) -> usize {
        match &self.node.kind {
            NodeKind::Scalar(_) => 0,
            NodeKind::Mapping(children) => children.len(),
            NodeKind::Sequence(children) => children.len(),
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn scalar(self) -> Option<&'t Value> {
        let node: &'t Node = self.node;
        match &node.kind {
            NodeKind::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Keyed read on a mapping, positional read on a sequence. A scalar
    /// node answers with its own value whatever the selector.
    pub fn get(self, selector: impl Into<Selector>) -> Result<Item<'t>, MetatreeError> {
        let node: &'t Node = self.node;
        if let NodeKind::Scalar(v) = &node.kind {
            return Ok(Item::Scalar(v));
        }
        let child = self.child_id(selector)?;
        self.item(child)
    }

    pub fn child(self, selector: impl Into<Selector>) -> Result<NodeRef<'t>, MetatreeError> {
        self.tree.node(self.child_id(selector)?)
    }

    pub fn child_id(self, selector: impl Into<Selector>) -> Result<NodeId, MetatreeError> {
        let selector = selector.into();
        match &self.node.kind {
            NodeKind::Scalar(_) => Err(MetatreeError::WrongNodeKind {
                op: "child",
                found: NodeType::Scalar,
            }),
            NodeKind::Mapping(children) => {
                let key = selector
                    .as_key()
                    .ok_or_else(|| MetatreeError::InvalidIndex(selector.to_string()))?;
                children
                    .get(&key)
                    .ok_or_else(|| MetatreeError::KeyNotFound(describe_key(&key)))
            }
            NodeKind::Sequence(children) => {
                let index = selector
                    .as_index()
                    .ok_or_else(|| MetatreeError::InvalidIndex(selector.to_string()))?;
                children
                    .get(index)
                    .copied()
                    .ok_or(MetatreeError::IndexOutOfRange {
                        index,
                        len: children.len(),
                    })
            }
        }
    }

    pub fn contains_key(self, key: impl Into<Selector>) -> bool {
        match (&self.node.kind, key.into().as_key()) {
            (NodeKind::Mapping(children), Some(key)) => children.contains_key(&key),
            _ => false,
        }
    }

    pub fn keys(self) -> impl Iterator<Item = &'t Value> {
        self.mapping_entries().iter().map(|(k, _)| k)
    }

    pub fn iter(self) -> impl Iterator<Item = Item<'t>> {
        self.node
            .kind
            .child_ids()
            .into_iter()
            .filter_map(move |id| self.item(id).ok())
    }

    pub fn entries(self) -> impl Iterator<Item = (&'t Value, Item<'t>)> {
        self.mapping_entries()
            .iter()
            .filter_map(move |(k, id)| self.item(*id).ok().map(|item| (k, item)))
    }

    pub fn child_nodes(self) -> impl Iterator<Item = NodeRef<'t>> {
        self.iter().filter_map(|item| item.as_node())
    }

    pub fn extra(self, name: &str) -> Option<&'t Value> {
        let node: &'t Node = self.node;
        node.extras.get(name)
    }

    pub fn extras(self) -> impl Iterator<Item = (&'t str, &'t Value)> {
        let node: &'t Node = self.node;
        node.extras.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolves `name` on this node or, failing that, on the nearest
    /// ancestor that has it.
    ///
    /// Each node first checks its own mapping keys (mappings only), then
    /// its extra attributes, before handing the lookup to its parent. A
    /// local key therefore shadows the same key further up.
    pub fn property(self, name: &str) -> Result<Item<'t>, MetatreeError> {
        let key = Value::String(name.to_string());
        let mut current = Some(self);
        while let Some(node) = current {
            if let Some(item) = node.local_property(name, &key)? {
                return Ok(item);
            }
            current = match node.node.parent {
                Some(parent) => Some(node.tree.node(parent)?),
                None => None,
            };
        }
        Err(MetatreeError::PropertyNotFound(name.to_string()))
    }

    pub fn has_property(self, name: &str) -> bool {
        self.property(name).is_ok()
    }

    pub fn get_properties<S: AsRef<str>>(
        self,
        names: &[S],
    ) -> Result<Vec<Item<'t>>, MetatreeError> {
        names.iter().map(|n| self.property(n.as_ref())).collect()
    }

    /// Depth-first, post-order search over the mapping and sequence nodes
    /// below this one. See [`Query`].
    pub fn query<P>(self, predicate: P) -> Query<'t, P>
    where
        P: FnMut(NodeRef<'t>) -> Result<bool, MetatreeError>,
    {
        Query::new(self, predicate)
    }

    pub fn first<P>(self, predicate: P) -> Result<NodeRef<'t>, MetatreeError>
    where
        P: FnMut(NodeRef<'t>) -> Result<bool, MetatreeError>,
    {
        self.query(predicate)
            .next()
            .unwrap_or(Err(MetatreeError::NoMatch))
    }

    pub fn backing(self) -> Result<&'t Value, MetatreeError> {
        self.tree.backing_at(self.id)
    }

    pub fn to_value(self) -> Value {
        match &self.node.kind {
            NodeKind::Scalar(v) => v.clone(),
            NodeKind::Mapping(children) => Value::Mapping(
                children
                    .as_slice()
                    .iter()
                    .map(|(k, id)| (k.clone(), self.child_value(*id)))
                    .collect(),
            ),
            NodeKind::Sequence(children) => {
                Value::Sequence(children.iter().map(|id| self.child_value(*id)).collect())
            }
        }
    }

    pub(crate) fn child_id_at(self, position: usize) -> Option<NodeId> {
        self.node.kind.child_at(position)
    }

    fn local_property(self, name: &str, key: &Value) -> Result<Option<Item<'t>>, MetatreeError> {
        let node: &'t Node = self.node;
        if let NodeKind::Mapping(children) = &node.kind {
            if let Some(child) = children.get(key) {
                return self.item(child).map(Some);
            }
        }
        Ok(node.extras.get(name).map(Item::Scalar))
    }

    fn mapping_entries(self) -> &'t [(Value, NodeId)] {
        let node: &'t Node = self.node;
        match &node.kind {
            NodeKind::Mapping(children) => children.as_slice(),
            _ => &[],
        }
    }

    fn item(self, id: NodeId) -> Result<Item<'t>, MetatreeError> {
        let child = self.tree.node(id)?;
        let node: &'t Node = child.node;
        Ok(match &node.kind {
            NodeKind::Scalar(v) => Item::Scalar(v),
            _ => Item::Node(child),
        })
    }

    fn child_value(self, id: NodeId) -> Value {
        self.tree
            .node(id)
            .map(NodeRef::to_value)
            .unwrap_or(Value::Null)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id.index())
            .field("type", &self.node_type())
            .field("depth", &self.depth())
            .field("len", &self.len())
            .finish()
    }
}
