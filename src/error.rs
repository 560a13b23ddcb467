use alloc::collections::TryReserveError;

use thiserror::Error;

/// Result type alias for tree operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by [`BTree`](crate::BTree) operations.
///
/// A failed mutating call leaves the tree exactly as it was before the call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A constructor or operation argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Reserving memory for nodes or values failed before the tree was touched.
    #[error("allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),
    /// The tree already addresses the maximum number of nodes or values.
    #[error("capacity exceeded: at most {max} slots can be addressed")]
    CapacityExceeded {
        /// The maximum number of addressable slots.
        max: usize,
    },
    /// The key is not present.
    #[error("key not found")]
    NotFound,
    /// A structural invariant does not hold. Only reported by `validate`.
    #[error("invariant violation: {0}")]
    InvariantViolation(Violation),
}

/// Describes the first structural defect found by `validate`.
///
/// Nodes are identified by their arena slot index.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    /// A node holds fewer or more keys than its position allows.
    #[error("node {node} holds {count} keys, expected {min}..={max}")]
    KeyCount {
        node: usize,
        count: usize,
        min: usize,
        max: usize,
    },
    /// Keys within a node are not strictly increasing.
    #[error("node {node} keys at {index} and {} are not strictly increasing", .index + 1)]
    Unordered { node: usize, index: usize },
    /// A key lies outside the range fixed by the separators above it.
    #[error("node {node} key at {index} lies outside its separator bounds")]
    OutOfBounds { node: usize, index: usize },
    /// An internal node does not have exactly one more child than keys.
    #[error("node {node} has {keys} keys but {children} children")]
    ChildCount {
        node: usize,
        keys: usize,
        children: usize,
    },
    /// Leaves are not all at the same depth.
    #[error("leaf {node} at depth {found}, expected {expected}")]
    LeafDepth {
        node: usize,
        expected: usize,
        found: usize,
    },
    /// The recorded entry count disagrees with the entries reachable from the root.
    #[error("recorded length {recorded} but {counted} entries are reachable")]
    LengthMismatch { recorded: usize, counted: usize },
}

impl From<Violation> for Error {
    fn from(violation: Violation) -> Self {
        Error::InvariantViolation(violation)
    }
}
