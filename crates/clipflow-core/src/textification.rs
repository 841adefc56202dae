/// Reduction of rich HTML to a paragraph/line-break skeleton.
///
/// Used when the caller demanded plain-text semantics but genuine HTML
/// arrived: presentational markup is stripped down to the minimal structure
/// that still reads like the original text. The output contains nothing but
/// paragraph and line-break elements.
use anyhow::{Context, Result};
use regex::{Captures, Regex};

use clipflow_config::BlockMode;

use crate::markup::{self, categories, Element, Node};
use crate::textify::switch_block_mode;

#[derive(Debug)]
pub struct Textifier {
    url_like_alt: Regex,
    space_around_tags: Regex,
    duplicate_breaks: Regex,
    break_then_boundary: Regex,
    boundary_then_break: Regex,
    rename_breaks: Regex,
    p_tokens: Regex,
}

impl Textifier {
    pub fn new() -> Result<Self> {
        let build =
            |src: &str| Regex::new(src).with_context(|| format!("invalid cleanup pattern: {src}"));
        Ok(Self {
            url_like_alt: build(r"(?i)(^http|\.(jpe?g|gif|png))")?,
            space_around_tags: build(r"\s*(</?[a-z:]+ ?/?>)\s*")?,
            duplicate_breaks: build(r"(<cf:br />){2,}")?,
            break_then_boundary: build(r"<cf:br />(</?p>|<br />)")?,
            boundary_then_break: build(r"(</?p>|<br />)<cf:br />")?,
            rename_breaks: build(r"<(cf:)?br( /)?>")?,
            p_tokens: build(r"</?p>")?,
        })
    }

    /// Rewrites `html` into markup containing only paragraphs and breaks.
    pub fn textify_html(&self, html: &str, mode: BlockMode) -> String {
        let nodes = markup::parse(html);
        let rewritten = self.rewrite_nodes(nodes);
        let mut data = markup::write_nodes(&rewritten);

        // Serialized cleanup: placeholder breaks collapse into real ones,
        // spaces around tags and empty paragraphs go away.
        data = self.space_around_tags.replace_all(&data, "$1").into_owned();
        data = self.duplicate_breaks.replace_all(&data, "<cf:br />").into_owned();
        data = self.break_then_boundary.replace_all(&data, "$1").into_owned();
        data = self.boundary_then_break.replace_all(&data, "$1").into_owned();
        data = self.rename_breaks.replace_all(&data, "<br>").into_owned();
        data = data.replace("<p></p>", "");

        data = self.flatten_nested_paragraphs(&data);

        switch_block_mode(mode, &data)
    }

    /// A paragraph opened while one is already open closes the outer one and
    /// reopens it as a sibling afterwards.
    fn flatten_nested_paragraphs(&self, data: &str) -> String {
        let mut depth = 0i32;
        let flattened = self
            .p_tokens
            .replace_all(data, |caps: &Captures| {
                if &caps[0] == "<p>" {
                    depth += 1;
                    if depth > 1 {
                        "</p><p>".to_string()
                    } else {
                        "<p>".to_string()
                    }
                } else {
                    depth -= 1;
                    if depth > 0 {
                        "</p><p>".to_string()
                    } else {
                        "</p>".to_string()
                    }
                }
            })
            .into_owned();
        flattened.replace("<p></p>", "")
    }

    fn rewrite_nodes(&self, nodes: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::new();
        let mut iter = nodes.into_iter().peekable();

        while let Some(node) = iter.next() {
            match node {
                Node::Text(text) => out.push(Node::Text(text)),
                Node::Element(el) if categories::is_heading(&el.name) => {
                    // Headings are block separators, but in text form they
                    // degrade to inline breaks: adjacent headings merge into
                    // one paragraph joined by breaks.
                    let mut merged = Element::new("p");
                    merged.children = self.rewrite_nodes(el.children);
                    while matches!(
                        iter.peek(),
                        Some(Node::Element(next)) if categories::is_heading(&next.name)
                    ) {
                        if let Some(Node::Element(next)) = iter.next() {
                            merged.children.push(synthetic_break());
                            merged.children.extend(self.rewrite_nodes(next.children));
                        }
                    }
                    out.push(Node::Element(merged));
                }
                Node::Element(el) => self.rewrite_element(el, &mut out),
            }
        }

        out
    }

    fn rewrite_element(&self, el: Element, out: &mut Vec<Node>) {
        let name = el.name.as_str();

        if categories::is_removed(name) {
            return;
        }

        if name == "img" {
            // An image degrades to its alt text, unless the alt is a bare
            // URL or file name that would leak noise into plain text.
            let alt = el.attr("alt").unwrap_or("").trim().to_string();
            if !alt.is_empty() && !self.url_like_alt.is_match(&alt) {
                out.push(Node::Text(format!(" [{alt}] ")));
            } else {
                out.push(Node::Text(" ".to_string()));
            }
            return;
        }

        if name == "td" || name == "th" {
            let children = self.rewrite_nodes(el.children);
            out.extend(children);
            out.push(Node::Text(" ".to_string()));
            return;
        }

        if name == "br" {
            out.push(Node::Element(Element::new("br")));
            return;
        }

        if categories::is_vertical(name) {
            let mut para = Element::new("p");
            para.children = self.rewrite_nodes(el.children);
            out.push(Node::Element(para));
            return;
        }

        if categories::is_inline(name) {
            out.extend(self.rewrite_nodes(el.children));
            return;
        }

        if categories::is_known(name) {
            if categories::is_void(name) {
                out.push(synthetic_break());
                return;
            }
            out.push(synthetic_break());
            out.extend(self.rewrite_nodes(el.children));
            out.push(synthetic_break());
            return;
        }

        // Unrecognized element: drop the tag, keep the content.
        out.extend(self.rewrite_nodes(el.children));
    }
}

fn synthetic_break() -> Node {
    Node::Element(Element::new(categories::SYNTHETIC_BREAK))
}
