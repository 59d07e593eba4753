use crate::treap::NodeRef;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("node handle {0:?} does not name a live node")]
    StaleHandle(NodeRef),

    #[error("key {0} not found")]
    KeyNotFound(u32),

    #[error("invariant violated at key {key}: {reason}")]
    InvariantViolated { key: u32, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
