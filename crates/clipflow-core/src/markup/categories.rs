/// Element category tables used by the rewrite passes.

/// Tag used for placeholder line breaks inserted by the textification pass.
/// Renamed to a real `<br>` during serialization cleanup; the namespaced
/// name cannot collide with anything a browser pastes.
pub const SYNTHETIC_BREAK: &str = "cf:br";

/// Elements that never have children.
const VOID: &[&str] = &[
    "area", "base", "basefont", "br", "cf:br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose raw body is captured without tag scanning.
const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

/// Elements producing vertical whitespace; textification renames them to
/// paragraphs.
const VERTICAL: &[&str] = &[
    "blockquote", "dl", "fieldset", "h1", "h2", "h3", "h4", "h5", "h6", "ol", "p", "table", "ul",
];

/// Purely inline elements (line breaks excluded); textification unwraps them.
const INLINE: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "cite", "code", "del", "dfn", "em", "font",
    "i", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strike", "strong",
    "sub", "sup", "time", "tt", "u", "var",
];

/// Elements removed together with their content: no body semantics, head-only
/// metadata, or raw-text/CDATA bodies.
const REMOVED: &[&str] = &[
    "area", "base", "basefont", "embed", "head", "iframe", "link", "map", "meta", "noscript",
    "object", "param", "script", "style", "title",
];

/// Other recognized elements; textification keeps their content between
/// placeholder breaks.
const KNOWN_OTHER: &[&str] = &[
    "address", "article", "aside", "body", "caption", "center", "colgroup", "dd", "details",
    "dir", "div", "dt", "figcaption", "figure", "footer", "form", "header", "hr", "html", "img",
    "input", "legend", "li", "main", "menu", "nav", "pre", "section", "select", "summary",
    "tbody", "td", "textarea", "tfoot", "th", "thead", "tr", "wbr",
];

/// Block-level elements, used by the artifact scrubber to decide whether a
/// leading/trailing fragment belongs to block markup.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dir", "div", "dl",
    "fieldset", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

pub fn is_void(name: &str) -> bool {
    VOID.contains(&name)
}

pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT.contains(&name)
}

pub fn is_vertical(name: &str) -> bool {
    VERTICAL.contains(&name)
}

pub fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub fn is_inline(name: &str) -> bool {
    INLINE.contains(&name)
}

pub fn is_removed(name: &str) -> bool {
    REMOVED.contains(&name)
}

pub fn is_block(name: &str) -> bool {
    BLOCK.contains(&name)
}

/// True for any element this crate recognizes at all.
pub fn is_known(name: &str) -> bool {
    name == "br"
        || is_vertical(name)
        || is_inline(name)
        || is_removed(name)
        || KNOWN_OTHER.contains(&name)
}
