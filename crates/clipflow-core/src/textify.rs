/// Plain text to canonical HTML conversion.
use clipflow_config::BlockMode;

use crate::entities;

/// Normalizes line endings to `\n`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Converts plain text (possibly with line breaks) into canonical HTML.
///
/// Escapes markup-significant characters, pads whitespace runs so they
/// survive HTML collapsing, and renders line breaks according to the block
/// mode: in paragraph/div mode a blank line starts a new block element and a
/// single break becomes `<br>`; in break-only mode every break becomes
/// `<br>` and nothing is wrapped.
///
/// `compensates_trailing_break` tells whether the target engine keeps a
/// block-final `<br>` visible by itself; when it does not, the break is
/// doubled.
pub fn textify(text: &str, mode: BlockMode, compensates_trailing_break: bool) -> String {
    let text = normalize_line_endings(text);
    let mut html = entities::encode_text(&text);
    html = pad_space_runs(&html);
    // Tabs expand independently of adjacent space runs.
    html = html.replace('\t', "&nbsp;&nbsp; &nbsp;");

    match mode.block_tag() {
        None => html.replace('\n', "<br>"),
        Some(tag) => {
            let mut out = if html.contains("\n\n") {
                let boundary = format!("</{tag}><{tag}>");
                format!("<{tag}>{}</{tag}>", html.replace("\n\n", &boundary))
            } else {
                html
            };
            out = out.replace('\n', "<br>");
            if !compensates_trailing_break {
                // A single <br> right before a closing block tag collapses;
                // double it to keep the empty line visible.
                let closing = format!("<br></{tag}>");
                let doubled = format!("<br><br></{tag}>");
                out = out.replace(&closing, &doubled);
            }
            out
        }
    }
}

/// Pads runs of two or more spaces with `&nbsp;` so their width survives
/// HTML whitespace collapsing. One breaking space is kept at the run's outer
/// edge (left edge for a line-leading run, right edge otherwise) so the line
/// can still wrap there.
fn pad_space_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        pad_line(line, &mut out);
    }
    out
}

fn pad_line(line: &str, out: &mut String) {
    let mut run = 0usize;
    let mut at_line_start = true;

    let flush = |run: usize, at_line_start: bool, out: &mut String| match run {
        0 => {}
        1 => out.push(' '),
        k if at_line_start => {
            out.push(' ');
            for _ in 0..k - 1 {
                out.push_str("&nbsp;");
            }
        }
        k => {
            for _ in 0..k - 1 {
                out.push_str("&nbsp;");
            }
            out.push(' ');
        }
    };

    for ch in line.chars() {
        if ch == ' ' {
            run += 1;
        } else {
            flush(run, at_line_start, out);
            run = 0;
            out.push(ch);
            at_line_start = false;
        }
    }
    flush(run, at_line_start, out);
}

/// Rewrites canonical paragraph markup into the configured block
/// representation. Shared final stage of the text and htmlified-text
/// normalizers.
pub fn switch_block_mode(mode: BlockMode, html: &str) -> String {
    match mode {
        BlockMode::Paragraph => html.to_string(),
        BlockMode::Div => html.replace("<p>", "<div>").replace("</p>", "</div>"),
        BlockMode::BreakOnly => html
            .replace("</p><p>", "<br><br>")
            .replace("<p>", "")
            .replace("</p>", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_only_single_breaks() {
        let html = textify("one\ntwo\nthree", BlockMode::BreakOnly, false);
        assert_eq!(html, "one<br>two<br>three");
    }

    #[test]
    fn test_break_only_no_block_wrapping() {
        let html = textify("a\n\nb", BlockMode::BreakOnly, false);
        assert_eq!(html, "a<br><br>b");
    }

    #[test]
    fn test_paragraph_mode_double_break() {
        let html = textify("first\n\nsecond", BlockMode::Paragraph, false);
        assert_eq!(html, "<p>first</p><p>second</p>");
    }

    #[test]
    fn test_div_mode_double_break() {
        let html = textify("first\n\nsecond", BlockMode::Div, false);
        assert_eq!(html, "<div>first</div><div>second</div>");
    }

    #[test]
    fn test_paragraph_mode_single_break_stays_inline() {
        let html = textify("a\nb", BlockMode::Paragraph, false);
        assert_eq!(html, "a<br>b");
    }

    #[test]
    fn test_block_final_break_doubled() {
        let html = textify("a\n\nb\n", BlockMode::Paragraph, false);
        assert_eq!(html, "<p>a</p><p>b<br><br></p>");
    }

    #[test]
    fn test_block_final_break_kept_when_engine_compensates() {
        let html = textify("a\n\nb\n", BlockMode::Paragraph, true);
        assert_eq!(html, "<p>a</p><p>b<br></p>");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            textify("1 < 2 & 3", BlockMode::BreakOnly, false),
            "1 &lt; 2 &amp; 3"
        );
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(
            textify("a\r\nb\rc", BlockMode::BreakOnly, false),
            "a<br>b<br>c"
        );
    }

    #[test]
    fn test_tab_expansion() {
        assert_eq!(
            textify("a\tb", BlockMode::BreakOnly, false),
            "a&nbsp;&nbsp; &nbsp;b"
        );
    }

    // ── whitespace-run padding ───────────────────────────────────────

    #[test]
    fn test_interior_run_padded_space_at_right_edge() {
        assert_eq!(
            textify("a  b", BlockMode::BreakOnly, false),
            "a&nbsp; b"
        );
        assert_eq!(
            textify("a    b", BlockMode::BreakOnly, false),
            "a&nbsp;&nbsp;&nbsp; b"
        );
    }

    #[test]
    fn test_single_interior_space_untouched() {
        assert_eq!(textify("a b", BlockMode::BreakOnly, false), "a b");
    }

    #[test]
    fn test_leading_run_keeps_space_at_left_edge() {
        assert_eq!(
            textify("  a", BlockMode::BreakOnly, false),
            " &nbsp;a"
        );
    }

    #[test]
    fn test_trailing_run_keeps_space_at_right_edge() {
        assert_eq!(
            textify("a  ", BlockMode::BreakOnly, false),
            "a&nbsp; "
        );
    }

    #[test]
    fn test_padding_applies_per_line() {
        assert_eq!(
            textify("a\n  b", BlockMode::BreakOnly, false),
            "a<br> &nbsp;b"
        );
    }

    #[test]
    fn test_switch_block_mode_break_only() {
        assert_eq!(
            switch_block_mode(BlockMode::BreakOnly, "<p>a</p><p>b</p>"),
            "a<br><br>b"
        );
    }

    #[test]
    fn test_switch_block_mode_div() {
        assert_eq!(
            switch_block_mode(BlockMode::Div, "<p>a</p><p>b</p>"),
            "<div>a</div><div>b</div>"
        );
    }
}
