use crate::error::MetatreeError;
use crate::node::NodeId;
use crate::tree::Tree;
use crate::view::NodeRef;

/// Lazy predicate search below a starting node.
///
/// For every mapping or sequence child, the child's own descendants are
/// searched before the child itself is tested, left to right. Scalar
/// children and the starting node are never tested. A predicate that fails
/// with [`MetatreeError::PropertyNotFound`] rejects the node; any other
/// predicate error is yielded and the search carries on.
pub struct Query<'t, P> {
    tree: &'t Tree,
    // (node, position of the next child to visit)
    stack: Vec<(NodeId, usize)>,
    predicate: P,
}

impl<'t, P> Query<'t, P> {
    pub(crate) fn new(start: NodeRef<'t>, predicate: P) -> Self {
        Self {
            tree: start.tree(),
            stack: vec![(start.id(), 0)],
            predicate,
        }
    }
}

impl<'t, P> Iterator for Query<'t, P>
where
    P: FnMut(NodeRef<'t>) -> Result<bool, MetatreeError>,
{
    type Item = Result<NodeRef<'t>, MetatreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let frame = self.stack.last_mut()?;
            let (id, position) = *frame;
            frame.1 += 1;

            let node = match tree.node(id) {
                Ok(node) => node,
                Err(e) => {
                    self.stack.pop();
                    return Some(Err(e));
                }
            };

            if let Some(child) = node.child_id_at(position) {
                match tree.node(child) {
                    Ok(c) if c.node_type().is_container() => self.stack.push((child, 0)),
                    Ok(_) => {}
                    Err(e) => return Some(Err(e)),
                }
                continue;
            }

            self.stack.pop();
            if self.stack.is_empty() {
                return None;
            }
            match (self.predicate)(node) {
                Ok(true) => return Some(Ok(node)),
                Ok(false) | Err(MetatreeError::PropertyNotFound(_)) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
