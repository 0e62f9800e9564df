use crate::error::MetatreeError;
use crate::node::{Children, Node, NodeId, NodeKind, NodeType, Value, classify, describe_key};
use crate::selector::Selector;
use crate::view::NodeRef;

const ROOT: NodeId = NodeId::new(0, 0);

/// A metadata tree over a raw backing value.
///
/// The backing value and the node arena are two views of the same data.
/// Every mutating method validates its arguments first and then updates
/// both.
#[derive(Debug, Clone)]
pub struct Tree {
    backing: Value,
    root: Node,
    // Index 0 belongs to the root, which lives outside the arena.
    slots: Vec<Slot>,
    free: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone)]
enum Step {
    Key(Value),
    Index(usize),
}

pub fn build_tree(raw: Value) -> Result<Tree, MetatreeError> {
    Tree::build(raw)
}

#[derive(Debug)]
pub enum Concat {
    Single(Tree),
    List(Vec<Tree>),
}

impl From<Tree> for Concat {
    fn from(tree: Tree) -> Self {
        Concat::Single(tree)
    }
}

impl From<Vec<Tree>> for Concat {
    fn from(trees: Vec<Tree>) -> Self {
        Concat::List(trees)
    }
}

/// Returns a single tree unchanged, or merges a list of trees under a fresh
/// parentless sequence root. Extra attributes stay on the nodes they were
/// set on.
pub fn concat(input: impl Into<Concat>) -> Tree {
    match input.into() {
        Concat::Single(tree) => tree,
        Concat::List(mut trees) => {
            let raw = Value::Sequence(
                trees
                    .iter_mut()
                    .map(|t| std::mem::replace(&mut t.backing, Value::Null))
                    .collect(),
            );
            let mut merged = Tree::from_container(raw);
            for (target, source) in merged.root.kind.child_ids().into_iter().zip(&trees) {
                merged.adopt_extras(target, source, ROOT);
            }
            merged
        }
    }
}

impl Tree {
    pub fn build(raw: Value) -> Result<Self, MetatreeError> {
        match classify(&raw) {
            NodeType::Scalar => Err(MetatreeError::TypeKind(NodeType::Scalar)),
            NodeType::Mapping | NodeType::Sequence => Ok(Self::from_container(raw)),
        }
    }

    fn from_container(raw: Value) -> Self {
        let mut tree = Self {
            backing: Value::Null,
            root: Node::new(None, 0, NodeKind::Sequence(Vec::new())),
            slots: vec![Slot {
                generation: 0,
                node: None,
            }],
            free: Vec::new(),
        };
        tree.root.kind = tree.build_kind(ROOT, 0, &raw);
        tree.backing = raw;
        tree
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, ROOT, &self.root)
    }

    pub fn root_id(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> Result<NodeRef<'_>, MetatreeError> {
        Ok(NodeRef::new(self, id, self.slot(id)?))
    }

    pub fn backing(&self) -> &Value {
        &self.backing
    }

    pub fn into_backing(self) -> Value {
        self.backing
    }

    /// Number of arena slots, live or waiting for reuse.
    pub fn arena_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        1 + self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Writes `value` at `selector` of a mapping or sequence node and
    /// rebuilds the child subtree for it. Any previous subtree is released.
    pub fn set(
        &mut self,
        id: NodeId,
        selector: impl Into<Selector>,
        value: impl Into<Value>,
    ) -> Result<(), MetatreeError> {
        let selector = selector.into();
        let value = value.into();
        let (depth, node_type) = self.shape(id)?;

        let previous = match node_type {
            NodeType::Mapping => {
                let key = selector
                    .as_key()
                    .ok_or_else(|| MetatreeError::InvalidIndex(selector.to_string()))?;
                match self.backing_at_mut(id)? {
                    Value::Mapping(m) => {
                        m.insert(key.clone(), value.clone());
                    }
                    _ => return Err(diverged(id)),
                }
                let child = self.wrap(id, depth + 1, &value);
                match &mut self.slot_mut(id)?.kind {
                    NodeKind::Mapping(children) => children.insert(key, child),
                    _ => None,
                }
            }
            NodeType::Sequence => {
                let index = self.checked_index(id, &selector)?;
                match self.backing_at_mut(id)? {
                    Value::Sequence(s) => match s.get_mut(index) {
                        Some(slot) => *slot = value.clone(),
                        None => return Err(diverged(id)),
                    },
                    _ => return Err(diverged(id)),
                }
                let child = self.wrap(id, depth + 1, &value);
                match &mut self.slot_mut(id)?.kind {
                    NodeKind::Sequence(children) => children
                        .get_mut(index)
                        .map(|slot| std::mem::replace(slot, child)),
                    _ => None,
                }
            }
            NodeType::Scalar => {
                return Err(MetatreeError::WrongNodeKind {
                    op: "set",
                    found: NodeType::Scalar,
                });
            }
        };

        if let Some(old) = previous {
            self.release(old);
        }
        Ok(())
    }

    pub fn delete(
        &mut self,
        id: NodeId,
        selector: impl Into<Selector>,
    ) -> Result<(), MetatreeError> {
        let selector = selector.into();
        let (_, node_type) = self.shape(id)?;

        let removed = match node_type {
            NodeType::Mapping => {
                let key = selector
                    .as_key()
                    .ok_or_else(|| MetatreeError::InvalidIndex(selector.to_string()))?;
                let present = match &self.slot(id)?.kind {
                    NodeKind::Mapping(children) => children.contains_key(&key),
                    _ => false,
                };
                if !present {
                    return Err(MetatreeError::KeyNotFound(describe_key(&key)));
                }

                match self.backing_at_mut(id)? {
                    Value::Mapping(m) => {
                        m.shift_remove(&key);
                    }
                    _ => return Err(diverged(id)),
                }
                match &mut self.slot_mut(id)?.kind {
                    NodeKind::Mapping(children) => children.shift_remove(&key),
                    _ => None,
                }
            }
            NodeType::Sequence => {
                let index = self.checked_index(id, &selector)?;
                match self.backing_at_mut(id)? {
                    Value::Sequence(s) if index < s.len() => {
                        s.remove(index);
                    }
                    _ => return Err(diverged(id)),
                }
                match &mut self.slot_mut(id)?.kind {
                    NodeKind::Sequence(children) => Some(children.remove(index)),
                    _ => None,
                }
            }
            NodeType::Scalar => {
                return Err(MetatreeError::WrongNodeKind {
                    op: "delete",
                    found: NodeType::Scalar,
                });
            }
        };

        if let Some(old) = removed {
            self.release(old);
        }
        Ok(())
    }

    /// Inserts before `index` of a sequence node; `index == len` appends.
    pub fn insert(
        &mut self,
        id: NodeId,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), MetatreeError> {
        let value = value.into();
        let (depth, node_type) = self.shape(id)?;
        if node_type != NodeType::Sequence {
            return Err(MetatreeError::WrongNodeKind {
                op: "insert",
                found: node_type,
            });
        }
        let len = self.slot(id)?.kind.child_ids().len();
        if index > len {
            return Err(MetatreeError::IndexOutOfRange { index, len });
        }

        match self.backing_at_mut(id)? {
            Value::Sequence(s) if index <= s.len() => s.insert(index, value.clone()),
            _ => return Err(diverged(id)),
        }
        let child = self.wrap(id, depth + 1, &value);
        if let NodeKind::Sequence(children) = &mut self.slot_mut(id)?.kind {
            children.insert(index, child);
        }
        Ok(())
    }

    pub fn push(&mut self, id: NodeId, value: impl Into<Value>) -> Result<(), MetatreeError> {
        let len = self.slot(id)?.kind.child_ids().len();
        self.insert(id, len, value)
    }

    /// Attaches an attribute that takes part in property lookup but is not
    /// part of the wrapped data.
    pub fn set_extra(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), MetatreeError> {
        self.slot_mut(id)?
            .extras
            .insert(name.to_string(), value.into());
        Ok(())
    }

    pub(crate) fn slot(&self, id: NodeId) -> Result<&Node, MetatreeError> {
        if id == ROOT {
            return Ok(&self.root);
        }
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(MetatreeError::NodeNotFound(id.index))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Node, MetatreeError> {
        if id == ROOT {
            return Ok(&mut self.root);
        }
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(MetatreeError::NodeNotFound(id.index))
    }

    fn shape(&self, id: NodeId) -> Result<(usize, NodeType), MetatreeError> {
        let node = self.slot(id)?;
        Ok((node.depth, node.kind.node_type()))
    }

    fn checked_index(&self, id: NodeId, selector: &Selector) -> Result<usize, MetatreeError> {
        let index = selector
            .as_index()
            .ok_or_else(|| MetatreeError::InvalidIndex(selector.to_string()))?;
        let len = self.slot(id)?.kind.child_ids().len();
        if index >= len {
            return Err(MetatreeError::IndexOutOfRange { index, len });
        }
        Ok(index)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.node = Some(node);
                return NodeId::new(index, slot.generation);
            }
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(self.slots.len() - 1, 0)
    }

    fn wrap(&mut self, parent: NodeId, depth: usize, value: &Value) -> NodeId {
        let id = self.alloc(Node::new(
            Some(parent),
            depth,
            NodeKind::Sequence(Vec::new()),
        ));
        let kind = self.build_kind(id, depth, value);
        if let Ok(node) = self.slot_mut(id) {
            node.kind = kind;
        }
        id
    }

    fn build_kind(&mut self, id: NodeId, depth: usize, value: &Value) -> NodeKind {
        match value {
            Value::Mapping(m) => NodeKind::Mapping(
                m.iter()
                    .map(|(k, v)| (k.clone(), self.wrap(id, depth + 1, v)))
                    .collect::<Children>(),
            ),
            Value::Sequence(s) => {
                NodeKind::Sequence(s.iter().map(|v| self.wrap(id, depth + 1, v)).collect())
            }
            scalar => NodeKind::Scalar(scalar.clone()),
        }
    }

    // Bumping the generation invalidates every outstanding id for the slot.
    fn release(&mut self, id: NodeId) {
        if id == ROOT {
            return;
        }
        let Some(slot) = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
        else {
            return;
        };
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        for child in node.kind.child_ids() {
            self.release(child);
        }
    }

    // Copies extras from `source` onto the matching nodes below `target`.
    // Both subtrees were built from the same data, so their shapes agree.
    fn adopt_extras(&mut self, target: NodeId, source: &Tree, from: NodeId) {
        let Ok(node) = source.slot(from) else {
            return;
        };
        if !node.extras.is_empty() {
            if let Ok(adopted) = self.slot_mut(target) {
                adopted.extras = node.extras.clone();
            }
        }
        let targets = self
            .slot(target)
            .map(|n| n.kind.child_ids())
            .unwrap_or_default();
        for (child, from) in targets.into_iter().zip(node.kind.child_ids()) {
            self.adopt_extras(child, source, from);
        }
    }

    fn path_to(&self, id: NodeId) -> Result<Vec<Step>, MetatreeError> {
        let mut steps = Vec::new();
        let mut current = id;
        while let Some(parent) = self.slot(current)?.parent {
            let step = match &self.slot(parent)?.kind {
                NodeKind::Mapping(children) => {
                    children.key_of(current).map(|k| Step::Key(k.clone()))
                }
                NodeKind::Sequence(children) => children
                    .iter()
                    .position(|child| *child == current)
                    .map(Step::Index),
                NodeKind::Scalar(_) => None,
            }
            .ok_or_else(|| {
                MetatreeError::Invariant(format!(
                    "node {} is detached from parent {}",
                    current.index, parent.index
                ))
            })?;
            steps.push(step);
            current = parent;
        }
        steps.reverse();
        Ok(steps)
    }

    pub(crate) fn backing_at(&self, id: NodeId) -> Result<&Value, MetatreeError> {
        let mut current = &self.backing;
        for step in self.path_to(id)? {
            current = match (current, &step) {
                (Value::Mapping(m), Step::Key(k)) => m.get(k),
                (Value::Sequence(s), Step::Index(i)) => s.get(*i),
                _ => None,
            }
            .ok_or_else(|| diverged(id))?;
        }
        Ok(current)
    }

    fn backing_at_mut(&mut self, id: NodeId) -> Result<&mut Value, MetatreeError> {
        let path = self.path_to(id)?;
        let mut current = &mut self.backing;
        for step in &path {
            current = match (current, step) {
                (Value::Mapping(m), Step::Key(k)) => m.get_mut(k),
                (Value::Sequence(s), Step::Index(i)) => s.get_mut(*i),
                _ => None,
            }
            .ok_or_else(|| diverged(id))?;
        }
        Ok(current)
    }
}

fn diverged(id: NodeId) -> MetatreeError {
    MetatreeError::Invariant(format!("backing value diverged from node {}", id.index))
}
