//! Minimal mutable HTML element tree.
//!
//! Just enough of a parser/writer to apply per-element rewrite rules:
//! permissive tokenizing, no entity decoding, no tag auto-closing (mis-nested
//! markup round-trips as written so downstream passes can repair it
//! textually). Not a sanitizer and nowhere near a full HTML parser, by
//! intent.

pub mod categories;
mod tokenizer;
mod writer;

pub use writer::write_nodes;

use tokenizer::Token;

/// A node in the parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }
}

/// An element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

/// Parses an HTML string into a list of sibling nodes.
///
/// Unmatched close tags are dropped; tags left open at the end of input are
/// closed implicitly. Comments and doctype/processing instructions are
/// discarded.
pub fn parse(source: &str) -> Vec<Node> {
    let mut root = Element::new("#root");
    let mut stack: Vec<Element> = Vec::new();

    for token in tokenizer::tokenize(source) {
        match token {
            Token::Text(text) => push_child(&mut root, &mut stack, Node::Text(text)),
            Token::Open {
                name,
                attributes,
                self_closing,
            } => {
                let element = Element {
                    name,
                    attributes,
                    children: Vec::new(),
                };
                if self_closing || categories::is_void(&element.name) {
                    push_child(&mut root, &mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Token::Close(name) => {
                if let Some(open_at) = stack.iter().rposition(|el| el.name == name) {
                    while stack.len() > open_at {
                        if let Some(el) = stack.pop() {
                            push_child(&mut root, &mut stack, Node::Element(el));
                        }
                    }
                }
                // Unmatched close tag: ignored.
            }
        }
    }

    while let Some(el) = stack.pop() {
        push_child(&mut root, &mut stack, Node::Element(el));
    }

    root.children
}

fn push_child(root: &mut Element, stack: &mut [Element], node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.children.push(node),
    }
}
