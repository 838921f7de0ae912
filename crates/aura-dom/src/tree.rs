//! DOM Tree (arena-based allocation)

use crate::{CommentData, DomError, DomResult, ElementData, Node, NodeData, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// Document root
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of nodes ever allocated (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the document node exists from construction
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    // === Creation ===

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeData::Text(content.to_string()))
    }

    /// Create a detached plain comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(NodeData::Comment(CommentData {
            content: content.to_string(),
            marker: false,
        }))
    }

    /// Create a detached marker comment
    pub fn create_marker(&mut self, label: &str) -> NodeId {
        self.push(NodeData::Comment(CommentData {
            content: label.to_string(),
            marker: true,
        }))
    }

    /// Create an empty document fragment
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    // === Navigation ===

    /// Parent node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent.get()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child.get()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child.get()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling.get()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling.get()
    }

    /// Iterate the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Child at `index`, if any
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Position among siblings, found by walking `previous_sibling` links
    pub fn index_in_parent(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut cursor = self.previous_sibling(id);
        while let Some(prev) = cursor {
            count += 1;
            cursor = self.previous_sibling(prev);
        }
        count
    }

    /// Whether the node has a parent
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.parent(id).is_some()
    }

    /// Whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether the node is a marker comment
    pub fn is_marker(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_marker)
    }

    /// Whether the node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    // === Mutation ===

    /// Detach a node from its parent. Detached nodes are left untouched.
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.node(id)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }

        if prev.is_valid() {
            self.nodes[prev.0 as usize].next_sibling = next;
        } else {
            self.nodes[parent.0 as usize].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling = prev;
        } else {
            self.nodes[parent.0 as usize].last_child = prev;
        }

        let node = &mut self.nodes[id.0 as usize];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }

    /// Append a child. Appending a fragment moves its children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    /// Inserting a fragment moves its children and leaves it empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if !self.node(parent)?.can_have_children() {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild { parent, node: reference });
            }
            if reference == child {
                return Ok(());
            }
        }

        if self.node(child)?.is_fragment() {
            let moved: Vec<NodeId> = self.children(child).collect();
            for node in moved {
                self.link_before(parent, node, reference)?;
            }
            return Ok(());
        }

        self.link_before(parent, child, reference)
    }

    fn link_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.contains(child, parent) || matches!(self.node(child)?.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.remove(child)?;

        let next = reference.unwrap_or(NodeId::NONE);
        let prev = if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling
        } else {
            self.nodes[parent.0 as usize].last_child
        };

        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.0 as usize].next_sibling = child;
        } else {
            self.nodes[parent.0 as usize].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling = child;
        } else {
            self.nodes[parent.0 as usize].last_child = child;
        }
        Ok(())
    }

    /// Insert as the first child of `parent`
    pub fn insert_first(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let first = self.first_child(parent);
        self.insert_before(parent, child, first)
    }

    /// Insert immediately after `reference` within its parent
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> DomResult<()> {
        let parent = self.node(reference)?.parent;
        if !parent.is_valid() {
            return Err(DomError::HierarchyRequest { parent: reference, child });
        }
        let next = self.next_sibling(reference);
        self.insert_before(parent, child, next)
    }

    // === Attributes ===

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .remove_attr(name))
    }

    /// Add class tokens to an element
    pub fn add_class(&mut self, id: NodeId, class_name: &str) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .add_class(class_name);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .is_some_and(|e| e.classes().any(|c| c == class_name))
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(text) => {
                text.clear();
                text.push_str(content);
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Comment(_)) | None => {}
            Some(_) => {
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_list() -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        tree.append_child(tree.root(), ul).unwrap();
        let items: Vec<NodeId> = (0..3)
            .map(|_| {
                let li = tree.create_element("li");
                tree.append_child(ul, li).unwrap();
                li
            })
            .collect();
        (tree, ul, items)
    }

    #[test]
    fn test_append_and_navigate() {
        let (tree, ul, items) = tree_with_list();
        assert_eq!(tree.children(ul).collect::<Vec<_>>(), items);
        assert_eq!(tree.first_child(ul), Some(items[0]));
        assert_eq!(tree.last_child(ul), Some(items[2]));
        assert_eq!(tree.next_sibling(items[0]), Some(items[1]));
        assert_eq!(tree.previous_sibling(items[2]), Some(items[1]));
        assert_eq!(tree.index_in_parent(items[2]), 2);
        assert_eq!(tree.child_at(ul, 1), Some(items[1]));
    }

    #[test]
    fn test_insert_before_and_remove() {
        let (mut tree, ul, items) = tree_with_list();
        let li = tree.create_element("li");
        tree.insert_before(ul, li, Some(items[1])).unwrap();
        assert_eq!(tree.index_in_parent(li), 1);

        tree.remove(items[0]).unwrap();
        assert!(!tree.is_attached(items[0]));
        assert_eq!(tree.first_child(ul), Some(li));
        // Removing a detached node is a no-op
        tree.remove(items[0]).unwrap();
    }

    #[test]
    fn test_reinsert_moves_node() {
        let (mut tree, ul, items) = tree_with_list();
        tree.append_child(ul, items[0]).unwrap();
        assert_eq!(tree.children(ul).collect::<Vec<_>>(), vec![items[1], items[2], items[0]]);
    }

    #[test]
    fn test_fragment_insertion_moves_children() {
        let (mut tree, ul, items) = tree_with_list();
        let frag = tree.create_fragment();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append_child(frag, a).unwrap();
        tree.append_child(frag, b).unwrap();

        tree.insert_before(ul, frag, Some(items[0])).unwrap();
        assert_eq!(tree.first_child(frag), None);
        assert_eq!(tree.children(ul).take(2).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_hierarchy_errors() {
        let (mut tree, ul, items) = tree_with_list();
        assert!(matches!(tree.append_child(items[0], ul), Err(DomError::HierarchyRequest { .. })));

        let text = tree.create_text("x");
        assert!(matches!(
            tree.append_child(text, items[0]),
            Err(DomError::HierarchyRequest { .. })
        ));

        let stray = tree.create_element("p");
        assert!(matches!(
            tree.insert_before(ul, items[0], Some(stray)),
            Err(DomError::NotAChild { .. })
        ));
    }

    #[test]
    fn test_markers() {
        let mut tree = DomTree::new();
        let marker = tree.create_marker("empty");
        let comment = tree.create_comment("plain");
        assert!(tree.is_marker(marker));
        assert!(!tree.is_marker(comment));
    }

    #[test]
    fn test_text_content() {
        let (mut tree, ul, items) = tree_with_list();
        let t = tree.create_text("hi");
        tree.append_child(items[1], t).unwrap();
        let c = tree.create_comment("ignored");
        tree.append_child(items[2], c).unwrap();
        assert_eq!(tree.text_content(ul), "hi");
    }
}
