//! HTML serializer for the rendered tree.

use crate::escape::escape_html;
use crate::tree::{Element, Node};

/// Elements that never have content or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Serialize nodes to an HTML string.
///
/// Text and attribute values are escaped here and nowhere else.
#[must_use]
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(4096);
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_html(text)),
        Node::Element(element) => serialize_element(element, out),
    }
}

fn serialize_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);

    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
        return;
    }

    for child in &element.children {
        serialize_node(child, out);
    }

    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}
