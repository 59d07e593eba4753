//! Probabilistic binary search tree where each node also maintains the heap invariant, with parent
//! links for handle-based removal and locality-promoting lookups.

mod node;
mod tree;

pub use self::node::{DetachedNode, NodeRef};
pub use self::tree::{Iter, Treap};
