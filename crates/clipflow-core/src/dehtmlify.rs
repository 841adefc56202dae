/// Normalization of browser-htmlified plain text.
///
/// When plain text is pasted into an editable region, engines wrap it in
/// minimal markup: WebKit produces `<div>` per line (empty-or-break divs for
/// blank lines), Gecko produces runs of adjacent `<br>`s. This module folds
/// those shapes into the same canonical paragraph markup the plain-text
/// normalizer produces, then applies the configured block mode.
use anyhow::{Context, Result};
use regex::{Captures, Regex};

use clipflow_config::{BlockMode, EngineFamily, EngineProfile};

use crate::textify::switch_block_mode;

#[derive(Debug)]
pub struct Dehtmlifier {
    family: EngineFamily,
    whitespace: Regex,
    between_tags: Regex,
    br_xhtml: Regex,
    upper_tags: Regex,
    single_char: Regex,
    empty_div_run: Regex,
    br_run: Regex,
}

impl Dehtmlifier {
    pub fn new(family: EngineFamily) -> Result<Self> {
        let build = |src: &str| Regex::new(src).with_context(|| format!("invalid fold pattern: {src}"));
        Ok(Self {
            family,
            whitespace: build(r"\s+")?,
            between_tags: build(r"> +<")?,
            br_xhtml: build(r"(?i)<br ?/>")?,
            upper_tags: build(r"</?[A-Z]+>")?,
            single_char: build(r"^[^<]$")?,
            empty_div_run: build(r"(<div>(<br>|)</div>)+")?,
            br_run: build(r"(<br>){2,}")?,
        })
    }

    /// Folds engine paste artifacts in `markup` into canonical form.
    pub fn normalize(&self, markup: &str, mode: BlockMode) -> String {
        // Adjacent whitespace (EOLs too, Gecko sometimes keeps them) becomes
        // one space; spaces between tags are artifacts of serialization.
        let mut data = self.whitespace.replace_all(markup, " ").into_owned();
        data = self.between_tags.replace_all(&data, "><").into_owned();
        data = self.br_xhtml.replace_all(&data, "<br>").into_owned();
        data = self
            .upper_tags
            .replace_all(&data, |caps: &Captures| caps[0].to_lowercase())
            .into_owned();

        // Single characters have nothing to fold.
        if self.single_char.is_match(&data) {
            return data;
        }

        let profile = EngineProfile::of(self.family);

        if profile.webkit_like() && data.contains("<div>") {
            data = fold_leading_div_groups(&data);

            // Each group of empty divs encodes consecutive line breaks; two
            // of them make one paragraph boundary.
            if data.contains("<div><br></div>") || data.contains("<div></div>") {
                data = format!(
                    "<p>{}</p>",
                    self.empty_div_run.replace_all(&data, |caps: &Captures| {
                        let breaks = caps[0].split("</div><div>").count() + 1;
                        repeat_paragraphs(breaks)
                    })
                );
            }

            // A single inter-div boundary is one line break.
            data = data.replace("</div><div>", "<br>");
            data = data.replace("<div>", "").replace("</div>", "");
        }

        if self.family == EngineFamily::Gecko && mode != BlockMode::BreakOnly {
            // Gecko emits two <br>s for one trailing line break; prefer
            // misreading two real breaks over doubling every single one.
            if data == "<br><br>" {
                data = "<br>".to_string();
            }

            if data.contains("<br><br>") {
                data = format!(
                    "<p>{}</p>",
                    self.br_run.replace_all(&data, |caps: &Captures| {
                        let breaks = caps[0].len() / "<br>".len();
                        repeat_paragraphs(breaks)
                    })
                );
            }
        }

        switch_block_mode(mode, &data)
    }
}

/// `breaks` consecutive line breaks produce breaks/2 paragraph boundaries;
/// an odd count leaves one visible break at the start of the last paragraph.
fn repeat_paragraphs(breaks: usize) -> String {
    let mut out = "</p><p>".repeat(breaks / 2);
    if breaks % 2 == 1 {
        out.push_str("<br>");
    }
    out
}

/// Matches one leading empty-div group, returning its length.
fn empty_div_group_len(data: &str) -> Option<usize> {
    for group in ["<div><br></div>", "<div></div>"] {
        if data.starts_with(group) {
            return Some(group.len());
        }
    }
    None
}

/// Leading empty-div groups mean line breaks at the very beginning of the
/// pasted text; fold a single one into `<br>` and reduce a longer prefix by
/// one line (the first wrapper is the insertion line itself).
fn fold_leading_div_groups(data: &str) -> String {
    let Some(first) = empty_div_group_len(data) else {
        return data.to_string();
    };
    let rest = &data[first..];
    match empty_div_group_len(rest) {
        None => {
            if rest.is_empty() {
                data.to_string()
            } else {
                format!("<br>{rest}")
            }
        }
        Some(second) => {
            let tail = &rest[second..];
            if tail.is_empty() {
                data.to_string()
            } else {
                format!("<div></div>{tail}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(family: EngineFamily) -> Dehtmlifier {
        Dehtmlifier::new(family).expect("static patterns compile")
    }

    #[test]
    fn test_syntax_normalization() {
        let d = folder(EngineFamily::Other);
        assert_eq!(
            d.normalize("a  <BR> <br />b", BlockMode::Paragraph),
            "a <br><br>b"
        );
    }

    #[test]
    fn test_single_char_untouched() {
        let d = folder(EngineFamily::WebKit);
        assert_eq!(d.normalize("x", BlockMode::Paragraph), "x");
    }

    #[test]
    fn test_webkit_lines_to_breaks() {
        let d = folder(EngineFamily::WebKit);
        assert_eq!(
            d.normalize("<div>one</div><div>two</div>", BlockMode::Paragraph),
            "one<br>two"
        );
    }

    #[test]
    fn test_webkit_blank_line_makes_paragraph() {
        let d = folder(EngineFamily::WebKit);
        // one\n\ntwo pasted into WebKit: text div, empty div, text div.
        assert_eq!(
            d.normalize(
                "<div>one</div><div><br></div><div>two</div>",
                BlockMode::Paragraph
            ),
            "<p>one</p><p>two</p>"
        );
    }

    #[test]
    fn test_webkit_three_breaks_leave_visible_br() {
        let d = folder(EngineFamily::WebKit);
        // one\n\n\ntwo: two adjacent empty divs.
        assert_eq!(
            d.normalize(
                "<div>one</div><div><br></div><div><br></div><div>two</div>",
                BlockMode::Paragraph
            ),
            "<p>one</p><p><br>two</p>"
        );
    }

    #[test]
    fn test_webkit_leading_blank_line() {
        let d = folder(EngineFamily::WebKit);
        assert_eq!(
            d.normalize("<div><br></div><div>two</div>", BlockMode::Paragraph),
            "<br>two"
        );
    }

    #[test]
    fn test_webkit_break_only_mode() {
        let d = folder(EngineFamily::WebKit);
        assert_eq!(
            d.normalize(
                "<div>one</div><div><br></div><div>two</div>",
                BlockMode::BreakOnly
            ),
            "one<br><br>two"
        );
    }

    #[test]
    fn test_webkit_div_mode() {
        let d = folder(EngineFamily::WebKit);
        assert_eq!(
            d.normalize(
                "<div>one</div><div><br></div><div>two</div>",
                BlockMode::Div
            ),
            "<div>one</div><div>two</div>"
        );
    }

    #[test]
    fn test_gecko_double_break_makes_paragraph() {
        let d = folder(EngineFamily::Gecko);
        assert_eq!(
            d.normalize("one<br><br>two", BlockMode::Paragraph),
            "<p>one</p><p>two</p>"
        );
    }

    #[test]
    fn test_gecko_four_breaks_make_two_boundaries() {
        let d = folder(EngineFamily::Gecko);
        assert_eq!(
            d.normalize("one<br><br><br><br>two", BlockMode::Paragraph),
            "<p>one</p><p></p><p>two</p>"
        );
    }

    #[test]
    fn test_gecko_lone_double_break_is_one_break() {
        let d = folder(EngineFamily::Gecko);
        assert_eq!(d.normalize("<br><br>", BlockMode::Paragraph), "<br>");
    }

    #[test]
    fn test_gecko_break_only_leaves_breaks() {
        let d = folder(EngineFamily::Gecko);
        assert_eq!(
            d.normalize("one<br><br>two", BlockMode::BreakOnly),
            "one<br><br>two"
        );
    }

    #[test]
    fn test_idempotent_on_canonical_break_only() {
        let d = folder(EngineFamily::WebKit);
        let canonical = crate::textify::textify("a\nb\nc", BlockMode::BreakOnly, false);
        assert_eq!(d.normalize(&canonical, BlockMode::BreakOnly), canonical);
    }
}
