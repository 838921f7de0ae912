//! Aura DOM - Document Object Model
//!
//! Arena-based DOM tree the rendering service reconciles against.
//! Nodes are never freed; removing a node only detaches it so that
//! component element lists can keep holding its id.

mod error;
mod node;
mod serialize;
mod tree;

pub use error::{DomError, DomResult};
pub use node::{Attribute, CommentData, ElementData, Node, NodeData};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" in sibling/parent links
    pub(crate) const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this ID points at a node
    #[inline]
    pub(crate) fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn get(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }

    /// Raw arena index, mostly useful for diagnostics
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
