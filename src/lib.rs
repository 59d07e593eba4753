//! A randomized treap over `u32` keys.
//!
//! `Treap` keeps search order on keys and max-heap order on random priorities, giving an expected
//! depth of `O(log N)` without any rebalancing pass. Nodes carry parent links and are addressed by
//! stable `NodeRef` handles, so a node found once can later be decoupled directly. The `trials`
//! module measures depth statistics over many randomly built treaps.

pub mod arena;
mod error;
pub mod treap;
pub mod trials;

pub use crate::error::{Error, Result};
pub use crate::treap::{DetachedNode, NodeRef, Treap};
