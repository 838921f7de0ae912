//! HTML serialization for inspection and tests

use crate::{DomTree, NodeData, NodeId};

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl DomTree {
    /// Serialize a node including itself
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document | NodeData::Fragment => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Text(text) => escape_into(text, false, out),
            NodeData::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(&comment.content);
                out.push_str("-->");
            }
            NodeData::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for attr in &elem.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&elem.tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::DomTree;

    #[test]
    fn test_serialize_nested() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "title", "a \"b\"").unwrap();
        let text = tree.create_text("1 < 2");
        let br = tree.create_element("br");
        let marker = tree.create_marker("m");
        tree.append_child(div, text).unwrap();
        tree.append_child(div, br).unwrap();
        tree.append_child(div, marker).unwrap();

        assert_eq!(
            tree.outer_html(div),
            "<div title=\"a &quot;b&quot;\">1 &lt; 2<br><!--m--></div>"
        );
        assert_eq!(tree.inner_html(div), "1 &lt; 2<br><!--m-->");
    }
}
