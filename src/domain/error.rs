//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeId;

/// Domain errors represent rule-tree violations.
/// Structural no-ops are not errors; see `application::IgnoreReason`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("incomplete entries present")]
    IncompleteEntries,

    #[error("group has no children: {0}")]
    EmptyGroup(NodeId),

    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("node {id} at depth {depth} exceeds max depth {max_deep}")]
    DepthExceeded {
        id: NodeId,
        depth: usize,
        max_deep: usize,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
