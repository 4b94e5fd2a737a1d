use thiserror::Error;

/// A broken structural invariant found by [`Tree::validate`](crate::Tree::validate).
///
/// Seeing one of these means the tree code or the comparator is defective;
/// it is never the outcome of ordinary use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root node has a parent link")]
    RootHasParent,

    #[error("child on side {side} does not link back to its parent")]
    BrokenParentLink { side: usize },

    #[error("in-order walk is not strictly increasing at position {position}")]
    OutOfOrder { position: usize },

    #[error("subtree heights differ by {difference}")]
    Unbalanced { difference: isize },

    #[error("stored balance factor {stored} does not match height difference {actual}")]
    BalanceMismatch { stored: i8, actual: isize },

    #[error("tree records {recorded} elements but holds {counted} nodes")]
    LenMismatch { recorded: usize, counted: usize },
}
