/// Serializes a node tree back to HTML.
use crate::entities;

use super::{categories, Node};

/// Writes `nodes` to an HTML string.
///
/// Text nodes are emitted verbatim (they are expected to carry their source
/// entities); void elements serialize in self-closing form.
pub fn write_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attributes {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&entities::encode_attribute(value));
                    out.push('"');
                }
            }
            if el.children.is_empty() && categories::is_void(&el.name) {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in &el.children {
                    write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}
