use crate::arena::Handle;

/// A handle to a node of a `Treap`.
///
/// Handles stay valid across rotations and promotions; a node keeps its handle until it is
/// decoupled or the treap is cleared.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeRef(pub(crate) Handle);

/// A node that has been unlinked from its treap and handed back to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DetachedNode {
    pub key: u32,
    pub priority: u32,
}

/// A struct representing an internal node of a treap.
///
/// `left` and `right` are the owning links of the tree; `parent` is only a back-reference and is
/// `None` exactly for the root.
pub struct Node {
    pub key: u32,
    pub priority: u32,
    pub left: Option<NodeRef>,
    pub right: Option<NodeRef>,
    pub parent: Option<NodeRef>,
}

impl Node {
    pub fn new(key: u32, priority: u32, parent: Option<NodeRef>) -> Self {
        Node {
            key,
            priority,
            left: None,
            right: None,
            parent,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn detach(self) -> DetachedNode {
        DetachedNode {
            key: self.key,
            priority: self.priority,
        }
    }
}
