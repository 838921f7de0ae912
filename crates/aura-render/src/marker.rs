//! Marker-based DOM positioning
//!
//! A component that renders nothing still needs a spot in the DOM so that
//! later content lands in the right place. That spot is a marker comment.

use aura_dom::{DomTree, NodeId};

/// Where a component sits in the DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// First real node the component rendered
    Element(NodeId),
    /// Marker comment standing in for zero rendered nodes
    Placeholder(NodeId),
}

impl Anchor {
    /// Classify an existing node
    pub fn from_node(dom: &DomTree, node: NodeId) -> Self {
        if dom.is_marker(node) {
            Self::Placeholder(node)
        } else {
            Self::Element(node)
        }
    }

    pub fn node(self) -> NodeId {
        match self {
            Self::Element(node) | Self::Placeholder(node) => node,
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// Create a marker comment, inserted right before `insert_before` when that
/// node is attached
pub fn create_marker(dom: &mut DomTree, insert_before: Option<NodeId>, label: &str) -> NodeId {
    let marker = dom.create_marker(label);
    if let Some(anchor) = insert_before {
        if let Some(parent) = dom.parent(anchor) {
            if let Err(err) = dom.insert_before(parent, marker, Some(anchor)) {
                tracing::warn!(%err, "Failed to position marker");
            }
        }
    }
    marker
}

/// Whether `node` is a marker comment
pub fn is_marker(dom: &DomTree, node: NodeId) -> bool {
    dom.is_marker(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_marker_before_anchor() {
        let mut dom = DomTree::new();
        let div = dom.create_element("div");
        let span = dom.create_element("span");
        dom.append_child(div, span).unwrap();

        let marker = create_marker(&mut dom, Some(span), "empty facet");
        assert!(is_marker(&dom, marker));
        assert_eq!(dom.first_child(div), Some(marker));
        assert_eq!(dom.next_sibling(marker), Some(span));
        assert_eq!(dom.inner_html(div), "<!--empty facet--><span></span>");
    }

    #[test]
    fn test_create_marker_detached() {
        let mut dom = DomTree::new();
        let marker = create_marker(&mut dom, None, "m");
        assert!(!dom.is_attached(marker));
        assert_eq!(Anchor::from_node(&dom, marker), Anchor::Placeholder(marker));

        let text = dom.create_text("x");
        assert_eq!(Anchor::from_node(&dom, text), Anchor::Element(text));
        assert!(!Anchor::Element(text).is_placeholder());
    }
}
