//! Markup parser
//!
//! Uses html5ever's RcDom and copies the body content into our tree.
//! The markup is parsed as a full document; whatever html5ever places
//! under `<body>` becomes the fragment.

use aura_dom::{DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::MarkupError;

/// Parse a markup fragment into detached top-level nodes of `tree`
pub fn parse_markup(tree: &mut DomTree, markup: &str) -> Result<Vec<NodeId>, MarkupError> {
    MarkupParser::new().parse_fragment(tree, markup)
}

/// Markup fragment parser
#[derive(Debug, Default)]
pub struct MarkupParser {
    /// Keep whitespace-only text nodes
    pub keep_whitespace: bool,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `markup` and return the detached top-level nodes, in order
    pub fn parse_fragment(
        &self,
        tree: &mut DomTree,
        markup: &str,
    ) -> Result<Vec<NodeId>, MarkupError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut markup.as_bytes())?;

        let Some(body) = find_element(&dom.document, "body") else {
            tracing::warn!("Markup produced no body; nothing to evaluate");
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for child in body.children.borrow().iter() {
            if let Some(id) = self.convert_node(child, tree)? {
                nodes.push(id);
            }
        }
        tracing::trace!(count = nodes.len(), "Evaluated markup into nodes");
        Ok(nodes)
    }

    /// Convert an RcDom node (and its subtree) into a detached node
    fn convert_node(
        &self,
        handle: &Handle,
        tree: &mut DomTree,
    ) -> Result<Option<NodeId>, MarkupError> {
        let id = match &handle.data {
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !self.keep_whitespace && text.trim().is_empty() {
                    return Ok(None);
                }
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value)?;
                }
                for child in handle.children.borrow().iter() {
                    if let Some(child_id) = self.convert_node(child, tree)? {
                        tree.append_child(id, child_id)?;
                    }
                }
                id
            }
            RcNodeData::Document
            | RcNodeData::Doctype { .. }
            | RcNodeData::ProcessingInstruction { .. } => {
                return Ok(None);
            }
        };
        Ok(Some(id))
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(|child| find_element(child, tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_siblings() {
        let mut tree = DomTree::new();
        let nodes = parse_markup(&mut tree, "<span class=\"a\">one</span> <b>two</b>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(tree.tag_name(nodes[0]), Some("span"));
        assert_eq!(tree.get_attribute(nodes[0], "class"), Some("a"));
        assert_eq!(tree.outer_html(nodes[1]), "<b>two</b>");
        assert!(!tree.is_attached(nodes[0]));
    }

    #[test]
    fn test_parse_text_and_comment() {
        let mut tree = DomTree::new();
        let nodes = parse_markup(&mut tree, "hello<!--note-->").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(tree.get(nodes[0]).and_then(|n| n.as_text()), Some("hello"));
        assert!(tree.get(nodes[1]).is_some_and(|n| n.is_comment()));
        assert!(!tree.is_marker(nodes[1]));
    }

    #[test]
    fn test_parse_empty() {
        let mut tree = DomTree::new();
        assert!(parse_markup(&mut tree, "   ").unwrap().is_empty());
    }
}
