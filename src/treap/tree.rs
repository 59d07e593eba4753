use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::treap::node::{DetachedNode, Node, NodeRef};
use log::{debug, trace};
use rand::{Rng, SeedableRng, XorShiftRng};
use std::cmp::Ordering;
use std::fmt;

const CHUNK_SIZE: usize = 1024;

/// A set of `u32` keys stored in a treap with parent links.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property.
/// Each node has a key and a priority. The key of any node is greater than all keys in its left
/// subtree and less than all keys occuring in its right subtree. The priority of a node is greater
/// than or equal to the priority of all nodes in its subtrees. By randomly generating priorities,
/// the expected height of the tree is proportional to the logarithm of the number of keys, even
/// when keys arrive in sorted order.
///
/// Nodes live in an arena owned by the treap and are addressed by `NodeRef` handles. Every node
/// also links back to its parent, which lets `decouple` remove a node given only its handle and
/// lets `usurping_find` move a node one level towards the root.
///
/// Priorities are drawn from `R`, any `rand::Rng`. Supplying a seeded or scripted generator
/// through `with_rng` makes the shape of the tree reproducible.
///
/// A `Treap` performs unsynchronized multi-node updates and is not meant to be shared across
/// threads without external locking.
///
/// # Examples
///
/// ```
/// use usurping_treap::Treap;
///
/// let mut treap = Treap::new();
/// let node = treap.insert(3);
/// treap.insert(1);
/// treap.insert(4);
///
/// assert_eq!(treap.find(3), Some(node));
/// assert_eq!(treap.find(2), None);
/// assert_eq!(treap.keys(), vec![1, 3, 4]);
///
/// let detached = treap.decouple(node).unwrap();
/// assert_eq!(detached.key, 3);
/// assert_eq!(treap.find(3), None);
/// assert_eq!(treap.len(), 2);
/// ```
pub struct Treap<R = XorShiftRng> {
    root: Option<NodeRef>,
    nodes: Arena<Node>,
    rng: R,
}

impl Treap<XorShiftRng> {
    /// Constructs a new, empty `Treap` whose priorities come from an OS-seeded xorshift generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let treap = Treap::new();
    /// assert!(treap.is_empty());
    /// ```
    pub fn new() -> Self {
        Treap::with_rng(rand::weak_rng())
    }

    /// Constructs a new, empty `Treap` whose priorities come from a xorshift generator seeded with
    /// `seed`. Two treaps built with the same seed and the same operations have the same shape.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is all zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut a = Treap::with_seed([1, 2, 3, 4]);
    /// let mut b = Treap::with_seed([1, 2, 3, 4]);
    /// for key in 0..100 {
    ///     a.insert(key);
    ///     b.insert(key);
    /// }
    /// assert_eq!(a.to_string(), b.to_string());
    /// ```
    pub fn with_seed(seed: [u32; 4]) -> Self {
        Treap::with_rng(XorShiftRng::from_seed(seed))
    }
}

impl Default for Treap<XorShiftRng> {
    fn default() -> Self {
        Treap::new()
    }
}

impl<R> Treap<R> {
    fn node(&self, node_ref: NodeRef) -> &Node {
        &self.nodes[node_ref.0]
    }

    fn node_mut(&mut self, node_ref: NodeRef) -> &mut Node {
        &mut self.nodes[node_ref.0]
    }

    // Points whichever slot referenced `old` (the parent's child slot, or the root slot) at `new`.
    fn replace_child(&mut self, parent: Option<NodeRef>, old: NodeRef, new: Option<NodeRef>) {
        match parent {
            None => self.root = new,
            Some(parent_ref) => {
                let parent = self.node_mut(parent_ref);
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    parent.right = new;
                }
            },
        }
    }

    // Promotes `pivot`, a direct child of `root`, into `root`'s position. Heap order is not
    // checked here.
    fn rotate(&mut self, root: NodeRef, pivot: NodeRef) {
        let grandparent = self.node(root).parent;
        if self.node(pivot).key < self.node(root).key {
            trace!("rotating {} right over {}", self.node(pivot).key, self.node(root).key);
            let inner = self.node(pivot).right;
            if let Some(inner_ref) = inner {
                self.node_mut(inner_ref).parent = Some(root);
            }
            self.node_mut(root).left = inner;
            self.node_mut(pivot).right = Some(root);
        } else {
            trace!("rotating {} left over {}", self.node(pivot).key, self.node(root).key);
            let inner = self.node(pivot).left;
            if let Some(inner_ref) = inner {
                self.node_mut(inner_ref).parent = Some(root);
            }
            self.node_mut(root).right = inner;
            self.node_mut(pivot).left = Some(root);
        }
        self.node_mut(pivot).parent = grandparent;
        self.replace_child(grandparent, root, Some(pivot));
        self.node_mut(root).parent = Some(pivot);
    }

    // Returns the child with the higher priority. Ties go to the right child.
    fn higher_child(&self, node_ref: NodeRef) -> Option<NodeRef> {
        let node = self.node(node_ref);
        match (node.left, node.right) {
            (Some(left_ref), Some(right_ref)) => {
                if self.node(left_ref).priority > self.node(right_ref).priority {
                    Some(left_ref)
                } else {
                    Some(right_ref)
                }
            },
            (child, None) | (None, child) => child,
        }
    }

    // Rotates `node_ref` downwards while a child has a strictly higher priority.
    fn sift_down(&mut self, node_ref: NodeRef) {
        while let Some(child_ref) = self.higher_child(node_ref) {
            if self.node(child_ref).priority <= self.node(node_ref).priority {
                break;
            }
            self.rotate(node_ref, child_ref);
        }
    }

    // Removes a live node, rotating it down until it has at most one child and then splicing it
    // out.
    fn unlink(&mut self, node_ref: NodeRef) -> DetachedNode {
        loop {
            let (left, right) = {
                let node = self.node(node_ref);
                (node.left, node.right)
            };
            match (left, right) {
                (Some(_), Some(_)) => {
                    if let Some(child_ref) = self.higher_child(node_ref) {
                        self.rotate(node_ref, child_ref);
                    }
                },
                (child, None) | (None, child) => {
                    let parent = self.node(node_ref).parent;
                    self.replace_child(parent, node_ref, child);
                    if let Some(child_ref) = child {
                        self.node_mut(child_ref).parent = parent;
                    }
                    break;
                },
            }
        }
        let detached = self.nodes.free(&node_ref.0).detach();
        debug!("decoupled key {}", detached.key);
        detached
    }

    /// Returns the node with key `key`, or `None` if no such node exists. The treap is not
    /// modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut treap = Treap::new();
    /// let node = treap.insert(1);
    /// assert_eq!(treap.find(1), Some(node));
    /// assert_eq!(treap.find(0), None);
    /// ```
    pub fn find(&self, key: u32) -> Option<NodeRef> {
        let mut curr = self.root;
        while let Some(node_ref) = curr {
            let node = self.node(node_ref);
            curr = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(node_ref),
            };
        }
        None
    }

    /// Returns the node with key `key` after moving it one level closer to the root, or `None` if
    /// no such node exists.
    ///
    /// The found node swaps priorities with its parent and then rotates over it, so no new
    /// priority is drawn. The demoted parent now holds the lower priority and is sifted down below
    /// any child that outranks it, which keeps heap order. The found node holds the largest
    /// priority of its subtree, so it rises by exactly one level. Repeated lookups of the same key
    /// walk it up to the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut treap = Treap::new();
    /// for key in 0..32 {
    ///     treap.insert(key);
    /// }
    /// let node = treap.find(7).unwrap();
    /// let depth = treap.depth(node);
    ///
    /// assert_eq!(treap.usurping_find(7), Some(node));
    /// assert_eq!(treap.depth(node), depth.saturating_sub(1));
    /// ```
    pub fn usurping_find(&mut self, key: u32) -> Option<NodeRef> {
        let node_ref = self.find(key)?;
        if let Some(parent_ref) = self.node(node_ref).parent {
            let parent_priority = self.node(parent_ref).priority;
            let priority = self.node(node_ref).priority;
            self.node_mut(node_ref).priority = parent_priority;
            self.node_mut(parent_ref).priority = priority;
            self.rotate(parent_ref, node_ref);
            self.sift_down(parent_ref);
            debug!("promoted key {}", key);
        }
        Some(node_ref)
    }

    /// Unlinks `node_ref` from the treap and returns its key and priority.
    ///
    /// The node is rotated downwards, always towards its higher-priority child, until it has at
    /// most one child, and then spliced out. Deleting by key is `find` followed by `decouple`;
    /// `remove` does both.
    ///
    /// Returns `Err(Error::StaleHandle)` if the handle no longer names a live node, for example
    /// because it was already decoupled. Handles issued by a different treap are not detected.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::{Error, Treap};
    ///
    /// let mut treap = Treap::new();
    /// let node = treap.insert(1);
    /// assert_eq!(treap.decouple(node).map(|detached| detached.key), Ok(1));
    /// assert_eq!(treap.decouple(node), Err(Error::StaleHandle(node)));
    /// ```
    pub fn decouple(&mut self, node_ref: NodeRef) -> Result<DetachedNode> {
        if !self.contains(node_ref) {
            return Err(Error::StaleHandle(node_ref));
        }
        Ok(self.unlink(node_ref))
    }

    /// Removes the node with key `key` and returns it, or returns `None` if no such node exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert(1);
    /// assert_eq!(treap.remove(1).map(|detached| detached.key), Some(1));
    /// assert_eq!(treap.remove(1), None);
    /// ```
    pub fn remove(&mut self, key: u32) -> Option<DetachedNode> {
        self.find(key).map(|node_ref| self.unlink(node_ref))
    }

    /// Returns `true` if `node_ref` names a live node of this treap.
    pub fn contains(&self, node_ref: NodeRef) -> bool {
        self.nodes.contains(&node_ref.0)
    }

    /// Returns `true` if the treap holds a node with key `key`.
    pub fn contains_key(&self, key: u32) -> bool {
        self.find(key).is_some()
    }

    /// Returns the root node, or `None` if the treap is empty.
    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    /// Returns the key of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn key(&self, node_ref: NodeRef) -> u32 {
        self.node(node_ref).key
    }

    /// Returns the priority of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn priority(&self, node_ref: NodeRef) -> u32 {
        self.node(node_ref).priority
    }

    /// Returns the parent of a node, or `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn parent(&self, node_ref: NodeRef) -> Option<NodeRef> {
        self.node(node_ref).parent
    }

    /// Returns the left child of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn left(&self, node_ref: NodeRef) -> Option<NodeRef> {
        self.node(node_ref).left
    }

    /// Returns the right child of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn right(&self, node_ref: NodeRef) -> Option<NodeRef> {
        self.node(node_ref).right
    }

    /// Returns the number of edges between a node and the root.
    ///
    /// # Panics
    ///
    /// Panics if `node_ref` does not name a live node.
    pub fn depth(&self, node_ref: NodeRef) -> usize {
        let mut depth = 0;
        let mut curr = self.node(node_ref).parent;
        while let Some(parent_ref) = curr {
            depth += 1;
            curr = self.node(parent_ref).parent;
        }
        depth
    }

    /// Returns the number of edges on the longest path from the root to a leaf. An empty treap and
    /// a treap with a single node both have a maximum depth of zero.
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeRef, usize)> =
            self.root.into_iter().map(|root_ref| (root_ref, 0)).collect();
        while let Some((node_ref, depth)) = stack.pop() {
            let node = self.node(node_ref);
            if node.is_leaf() {
                max_depth = max_depth.max(depth);
                continue;
            }
            for child_ref in node.left.iter().chain(node.right.iter()) {
                stack.push((*child_ref, depth + 1));
            }
        }
        max_depth
    }

    /// Returns the number of nodes in the treap.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the treap is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
    }

    /// Returns the keys of the treap in ascending order.
    pub fn keys(&self) -> Vec<u32> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Returns an iterator over the `(key, priority)` pairs of the treap in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert(2);
    /// treap.insert(1);
    ///
    /// let mut iterator = treap.iter().map(|(key, _)| key);
    /// assert_eq!(iterator.next(), Some(1));
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            treap: self,
            curr: self.root,
            stack: Vec::new(),
        }
    }

    /// Checks search order, heap order, and parent links over the whole treap.
    ///
    /// Returns the first violation found. Strict search order also rules out duplicate keys.
    pub fn validate(&self) -> Result<()> {
        let root_ref = match self.root {
            Some(root_ref) => root_ref,
            None if self.nodes.is_empty() => return Ok(()),
            None => {
                return Err(Error::InvariantViolated {
                    key: 0,
                    reason: "empty root with live nodes",
                })
            },
        };

        let mut visited = 0;
        let mut stack: Vec<(NodeRef, Option<NodeRef>, Option<u32>, Option<u32>)> =
            vec![(root_ref, None, None, None)];
        while let Some((node_ref, parent, lower, upper)) = stack.pop() {
            let node = self.nodes.get(&node_ref.0).ok_or(Error::StaleHandle(node_ref))?;
            let violation = |reason| Err(Error::InvariantViolated { key: node.key, reason });
            visited += 1;

            if node.parent != parent {
                return violation("parent link does not match the linking node");
            }
            if lower.map_or(false, |lower| node.key <= lower) {
                return violation("key not greater than an ancestor on its left");
            }
            if upper.map_or(false, |upper| node.key >= upper) {
                return violation("key not less than an ancestor on its right");
            }
            if let Some(parent_ref) = parent {
                if node.priority > self.node(parent_ref).priority {
                    return violation("priority exceeds parent priority");
                }
            }

            if let Some(left_ref) = node.left {
                stack.push((left_ref, Some(node_ref), lower, Some(node.key)));
            }
            if let Some(right_ref) = node.right {
                stack.push((right_ref, Some(node_ref), Some(node.key), upper));
            }
        }

        if visited != self.nodes.len() {
            return Err(Error::InvariantViolated {
                key: self.node(root_ref).key,
                reason: "live nodes unreachable from the root",
            });
        }
        Ok(())
    }

    fn fmt_subtree(&self, tree: Option<NodeRef>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match tree {
            Some(node_ref) => {
                let node = self.node(node_ref);
                write!(f, "  [")?;
                self.fmt_subtree(node.left, f)?;
                write!(f, "]-{}-[", node.key)?;
                self.fmt_subtree(node.right, f)?;
                write!(f, "]  ")
            },
            None => write!(f, "."),
        }
    }
}

impl<R: Rng> Treap<R> {
    /// Constructs a new, empty `Treap` drawing priorities from `rng`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use usurping_treap::Treap;
    ///
    /// let rng: rand::XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);
    /// let mut treap = Treap::with_rng(rng);
    /// treap.insert(0);
    /// ```
    pub fn with_rng(rng: R) -> Self {
        Treap {
            root: None,
            nodes: Arena::new(CHUNK_SIZE),
            rng,
        }
    }

    /// Inserts `key` and returns its node. If `key` is already present, the existing node is
    /// returned and the treap is left untouched.
    ///
    /// The new node gets a fresh random priority, is linked in as a leaf, and is then rotated
    /// upwards while its priority exceeds its parent's.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::Treap;
    ///
    /// let mut treap = Treap::new();
    /// let node = treap.insert(1);
    /// assert_eq!(treap.insert(1), node);
    /// assert_eq!(treap.len(), 1);
    /// ```
    pub fn insert(&mut self, key: u32) -> NodeRef {
        let mut parent = None;
        let mut curr = self.root;
        while let Some(node_ref) = curr {
            let node = self.node(node_ref);
            curr = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return node_ref,
            };
            parent = Some(node_ref);
        }

        let priority = self.rng.next_u32();
        let new_ref = NodeRef(self.nodes.allocate(Node::new(key, priority, parent)));
        match parent {
            None => self.root = Some(new_ref),
            Some(parent_ref) => {
                let parent = self.node_mut(parent_ref);
                if key < parent.key {
                    parent.left = Some(new_ref);
                } else {
                    parent.right = Some(new_ref);
                }
            },
        }

        while let Some(parent_ref) = self.node(new_ref).parent {
            if priority <= self.node(parent_ref).priority {
                break;
            }
            self.rotate(parent_ref, new_ref);
        }
        debug!("inserted key {} with priority {}", key, priority);
        new_ref
    }
}

impl<R> fmt::Display for Treap<R> {
    /// Renders the shape of the treap as nested brackets: `.` for an empty subtree and
    /// `  [<left>]-<key>-[<right>]  ` for a node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_subtree(self.root, f)
    }
}

impl<R> fmt::Debug for Treap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, R> IntoIterator for &'a Treap<R> {
    type Item = (u32, u32);
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator for `Treap<R>`.
///
/// This iterator traverses the elements of the treap in-order and yields `(key, priority)` pairs.
pub struct Iter<'a, R> {
    treap: &'a Treap<R>,
    curr: Option<NodeRef>,
    stack: Vec<NodeRef>,
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node_ref) = self.curr.take() {
            self.stack.push(node_ref);
            self.curr = self.treap.node(node_ref).left;
        }
        self.stack.pop().map(|node_ref| {
            let node = self.treap.node(node_ref);
            self.curr = node.right;
            (node.key, node.priority)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Treap;
    use crate::error::Error;
    use rand::Rng;

    struct Scripted {
        priorities: Vec<u32>,
        next: usize,
    }

    impl Rng for Scripted {
        fn next_u32(&mut self) -> u32 {
            let priority = self.priorities[self.next];
            self.next += 1;
            priority
        }
    }

    fn scripted(priorities: &[u32]) -> Treap<Scripted> {
        Treap::with_rng(Scripted {
            priorities: priorities.to_vec(),
            next: 0,
        })
    }

    #[test]
    fn test_len_empty() {
        let treap = Treap::new();
        assert_eq!(treap.len(), 0);
        assert_eq!(treap.max_depth(), 0);
        assert_eq!(treap.root(), None);
        assert_eq!(treap.validate(), Ok(()));
        assert_eq!(treap.to_string(), ".");
    }

    #[test]
    fn test_is_empty() {
        let treap = Treap::new();
        assert!(treap.is_empty());
    }

    #[test]
    fn test_insert_bubbles_up() {
        let mut treap = scripted(&[1, 5]);
        let low = treap.insert(10);
        let high = treap.insert(20);

        assert_eq!(treap.root(), Some(high));
        assert_eq!(treap.left(high), Some(low));
        assert_eq!(treap.right(high), None);
        assert_eq!(treap.parent(low), Some(high));
        assert_eq!(treap.parent(high), None);
        assert_eq!(treap.validate(), Ok(()));
    }

    #[test]
    fn test_insert_equal_priority_does_not_rotate() {
        let mut treap = scripted(&[5, 5]);
        let first = treap.insert(1);
        let second = treap.insert(2);
        assert_eq!(treap.root(), Some(first));
        assert_eq!(treap.parent(second), Some(first));
    }

    #[test]
    fn test_insert_duplicate_draws_no_priority() {
        let mut treap = scripted(&[3, 7]);
        let node = treap.insert(1);
        assert_eq!(treap.insert(1), node);
        assert_eq!(treap.priority(node), 3);
        treap.insert(2);
        assert_eq!(treap.priority(treap.find(2).unwrap()), 7);
    }

    #[test]
    fn test_rotate_right_and_left() {
        let mut treap = scripted(&[10, 5, 1, 2]);
        let b = treap.insert(20);
        let a = treap.insert(10);
        let inner = treap.insert(15);

        treap.rotate(b, a);
        assert_eq!(treap.root(), Some(a));
        assert_eq!(treap.right(a), Some(b));
        assert_eq!(treap.left(b), Some(inner));
        assert_eq!(treap.parent(inner), Some(b));
        assert_eq!(treap.parent(b), Some(a));
        assert_eq!(treap.parent(a), None);

        treap.rotate(a, b);
        assert_eq!(treap.root(), Some(b));
        assert_eq!(treap.left(b), Some(a));
        assert_eq!(treap.right(a), Some(inner));
        assert_eq!(treap.parent(inner), Some(a));
        assert_eq!(treap.validate(), Ok(()));
    }

    #[test]
    fn test_rotate_updates_grandparent() {
        let mut treap = scripted(&[100, 50, 10]);
        let top = treap.insert(1);
        let middle = treap.insert(5);
        let bottom = treap.insert(3);

        treap.rotate(middle, bottom);
        assert_eq!(treap.right(top), Some(bottom));
        assert_eq!(treap.parent(bottom), Some(top));
        assert_eq!(treap.right(bottom), Some(middle));
        assert_eq!(treap.keys(), vec![1, 3, 5]);
    }

    #[test]
    fn test_usurping_find_root_is_noop() {
        let mut treap = scripted(&[9, 1]);
        let root = treap.insert(1);
        treap.insert(2);
        assert_eq!(treap.usurping_find(1), Some(root));
        assert_eq!(treap.root(), Some(root));
        assert_eq!(treap.priority(root), 9);
    }

    #[test]
    fn test_usurping_find_swaps_priorities() {
        let mut treap = scripted(&[9, 1]);
        let root = treap.insert(1);
        let child = treap.insert(2);

        assert_eq!(treap.usurping_find(2), Some(child));
        assert_eq!(treap.root(), Some(child));
        assert_eq!(treap.priority(child), 9);
        assert_eq!(treap.priority(root), 1);
        assert_eq!(treap.usurping_find(3), None);
        assert_eq!(treap.validate(), Ok(()));
    }

    #[test]
    fn test_usurping_find_keeps_heap_with_sibling() {
        let mut treap = scripted(&[100, 10, 50]);
        let two = treap.insert(2);
        let one = treap.insert(1);
        let three = treap.insert(3);
        assert_eq!(treap.depth(one), 1);

        assert_eq!(treap.usurping_find(1), Some(one));
        assert_eq!(treap.validate(), Ok(()));
        assert_eq!(treap.root(), Some(one));
        assert_eq!(treap.depth(one), 0);
        assert_eq!(treap.right(one), Some(three));
        assert_eq!(treap.left(three), Some(two));
        assert_eq!(treap.parent(two), Some(three));
        assert_eq!(treap.priority(one), 100);
        assert_eq!(treap.priority(two), 10);
    }

    #[test]
    fn test_usurping_find_sifts_demoted_parent_past_inner_child() {
        let mut treap = scripted(&[100, 40, 90, 30, 35]);
        let four = treap.insert(4);
        let two = treap.insert(2);
        let six = treap.insert(6);
        let one = treap.insert(1);
        let three = treap.insert(3);
        assert_eq!(treap.parent(three), Some(two));

        assert_eq!(treap.usurping_find(2), Some(two));
        assert_eq!(treap.validate(), Ok(()));
        assert_eq!(treap.root(), Some(two));
        assert_eq!(treap.left(two), Some(one));
        assert_eq!(treap.right(two), Some(six));
        assert_eq!(treap.left(six), Some(four));
        assert_eq!(treap.left(four), Some(three));
        assert_eq!(treap.parent(three), Some(four));
        assert_eq!(treap.priority(four), 40);
        assert_eq!(treap.keys(), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_decouple_leaf_and_root() {
        let mut treap = scripted(&[9, 1]);
        let root = treap.insert(1);
        let leaf = treap.insert(2);

        let detached = treap.decouple(leaf).unwrap();
        assert_eq!((detached.key, detached.priority), (2, 1));
        assert_eq!(treap.right(root), None);

        treap.decouple(root).unwrap();
        assert!(treap.is_empty());
        assert_eq!(treap.len(), 0);
    }

    #[test]
    fn test_decouple_single_child_splices() {
        let mut treap = scripted(&[9, 5, 1]);
        treap.insert(1);
        let middle = treap.insert(2);
        let bottom = treap.insert(3);

        treap.decouple(middle).unwrap();
        assert_eq!(treap.parent(bottom), treap.root());
        assert_eq!(treap.keys(), vec![1, 3]);
        assert_eq!(treap.validate(), Ok(()));
    }

    #[test]
    fn test_decouple_rotates_towards_higher_priority() {
        let mut treap = scripted(&[9, 3, 7]);
        let root = treap.insert(2);
        let left = treap.insert(1);
        let right = treap.insert(3);

        treap.decouple(root).unwrap();
        assert_eq!(treap.root(), Some(right));
        assert_eq!(treap.left(right), Some(left));
        assert_eq!(treap.parent(left), Some(right));
        assert_eq!(treap.validate(), Ok(()));
    }

    #[test]
    fn test_decouple_stale_handle() {
        let mut treap = Treap::new();
        let node = treap.insert(1);
        treap.decouple(node).unwrap();
        treap.insert(2);
        assert_eq!(treap.decouple(node), Err(Error::StaleHandle(node)));
        assert_eq!(treap.len(), 1);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut treap = Treap::new();
        let node = treap.insert(1);
        treap.clear();
        assert!(treap.is_empty());
        assert!(!treap.contains(node));
        let new = treap.insert(1);
        assert_ne!(new, node);
        assert_eq!(treap.keys(), vec![1]);
    }

    #[test]
    fn test_validate_detects_broken_heap() {
        let mut treap = scripted(&[9, 1]);
        treap.insert(1);
        let child = treap.insert(2);
        treap.node_mut(child).priority = 10;
        assert_eq!(
            treap.validate(),
            Err(Error::InvariantViolated {
                key: 2,
                reason: "priority exceeds parent priority",
            }),
        );
    }

    #[test]
    fn test_validate_detects_broken_parent_link() {
        let mut treap = scripted(&[9, 1]);
        treap.insert(1);
        let child = treap.insert(2);
        treap.node_mut(child).parent = None;
        assert!(treap.validate().is_err());
    }

    #[test]
    fn test_depth_and_max_depth() {
        let mut treap = scripted(&[4, 3, 2, 1]);
        let nodes: Vec<_> = (0..4).map(|key| treap.insert(key)).collect();
        for (depth, node) in nodes.iter().enumerate() {
            assert_eq!(treap.depth(*node), depth);
        }
        assert_eq!(treap.max_depth(), 3);
    }

    #[test]
    fn test_display() {
        let mut treap = scripted(&[9, 1, 5]);
        treap.insert(2);
        treap.insert(1);
        treap.insert(3);
        assert_eq!(treap.to_string(), "  [  [.]-1-[.]  ]-2-[  [.]-3-[.]  ]  ");
    }

    #[test]
    fn test_debug() {
        let mut treap = scripted(&[9, 1]);
        treap.insert(2);
        treap.insert(1);
        assert_eq!(format!("{:?}", treap), "{(1, 1), (2, 9)}");
    }

    #[test]
    fn test_iter() {
        let mut treap = Treap::with_seed([1, 1, 1, 1]);
        for key in (0..100).rev() {
            treap.insert(key * 3);
        }
        assert_eq!(
            (&treap).into_iter().map(|(key, _)| key).collect::<Vec<u32>>(),
            (0..100).map(|key| key * 3).collect::<Vec<u32>>(),
        );
    }
}
