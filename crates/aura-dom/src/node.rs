//! DOM Node - Compact representation
//!
//! Uses NodeId (4 bytes) links instead of pointers. Marker comments are
//! ordinary comment nodes with a flag set at creation time; the flag can
//! never be toggled afterwards.

use crate::NodeId;

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached)
    pub(crate) parent: NodeId,
    /// First child
    pub(crate) first_child: NodeId,
    /// Last child (for O(1) append)
    pub(crate) last_child: NodeId,
    /// Previous sibling
    pub(crate) prev_sibling: NodeId,
    /// Next sibling
    pub(crate) next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Check if this is a comment (marker or not)
    #[inline]
    pub fn is_comment(&self) -> bool {
        matches!(self.data, NodeData::Comment(_))
    }

    /// Check if this is a marker comment
    #[inline]
    pub fn is_marker(&self) -> bool {
        matches!(&self.data, NodeData::Comment(c) if c.marker)
    }

    /// Check if this is a document fragment
    #[inline]
    pub fn is_fragment(&self) -> bool {
        matches!(self.data, NodeData::Fragment)
    }

    /// Whether this node may hold children
    #[inline]
    pub fn can_have_children(&self) -> bool {
        matches!(self.data, NodeData::Document | NodeData::Fragment | NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Detached container whose children move on insertion
    Fragment,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment, possibly a marker
    Comment(CommentData),
}

/// Comment payload
#[derive(Debug, Clone)]
pub struct CommentData {
    pub content: String,
    pub(crate) marker: bool,
}

impl CommentData {
    /// Whether this comment was created as a marker
    pub fn is_marker(&self) -> bool {
        self.marker
    }
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// Set an attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
            return;
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(idx).value)
    }

    /// Iterate the `class` attribute tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or("").split_whitespace()
    }

    /// Add every whitespace-separated token of `class_name` not yet present
    pub fn add_class(&mut self, class_name: &str) {
        let mut tokens: Vec<String> = self.classes().map(str::to_string).collect();
        let before = tokens.len();
        for token in class_name.split_whitespace() {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        if tokens.len() != before {
            self.set_attr("class", &tokens.join(" "));
        }
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_class_dedupes() {
        let mut elem = ElementData::new("DIV");
        assert_eq!(elem.tag, "div");
        elem.add_class("a b");
        elem.add_class("b c");
        assert_eq!(elem.get_attr("class"), Some("a b c"));
    }

    #[test]
    fn test_marker_flag() {
        let marker = Node::new(NodeData::Comment(CommentData {
            content: "m".into(),
            marker: true,
        }));
        let plain = Node::new(NodeData::Comment(CommentData {
            content: "c".into(),
            marker: false,
        }));
        assert!(marker.is_marker());
        assert!(plain.is_comment());
        assert!(!plain.is_marker());
    }
}
