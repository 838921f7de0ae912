//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not exist in this tree
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Insertion would create a cycle, or the parent cannot hold children
    #[error("hierarchy request error inserting {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Reference node is not a child of the given parent
    #[error("node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },

    /// Operation needs an element
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Operation needs a text node
    #[error("node {0} is not a text node")]
    NotText(NodeId),
}
