/// Engine-specific artifact scrubbing, run before content-type sniffing.
use anyhow::{Context, Result};
use regex::{Captures, Regex};

use clipflow_config::{EngineFamily, EngineProfile};

use crate::markup::{self, categories, Node};

/// Attribute a host puts on the root of a serialized edit surface. Content
/// copied from inside one surface and pasted into another arrives wrapped in
/// that root; the scrubber unwraps it.
pub const SURFACE_ROOT_ATTR: &str = "data-clipflow-surface";

/// Result of an artifact scrub pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrubOutcome {
    pub value: String,
    /// The artifacts proved this is real HTML, whatever sniffing would say.
    pub pre_sniffed_html: bool,
    /// Content started with a line break that the engine encoded out of band.
    pub starts_with_break: bool,
    /// Content ended with a line break that the engine encoded out of band.
    pub ends_with_break: bool,
}

/// Removes the garbage a given engine family injects around pasted markup.
#[derive(Debug)]
pub struct Scrubber {
    family: EngineFamily,
    converted_space: Regex,
    tab_span: Regex,
    apple_class: Regex,
    surface_root: Regex,
    trailing_br: Regex,
    trident_lead: Regex,
    webkit_tail: Regex,
    gecko_tail: Regex,
}

/// Out-of-band line-break marker understood by the WebKit family.
const INTERCHANGE_NEWLINE: &str = "<br class=\"Apple-interchange-newline\">";

impl Scrubber {
    pub fn new(family: EngineFamily) -> Result<Self> {
        let build = |src: &str| Regex::new(src).with_context(|| format!("invalid scrub pattern: {src}"));
        Ok(Self {
            family,
            converted_space: build(r#"(?i)<span class="Apple-converted-space">&nbsp;</span>"#)?,
            tab_span: build(r#"(?i)<span class="Apple-tab-span"[^>]*>([^<]*)</span>"#)?,
            apple_class: build(r#"(?i)(<[^>]+) class="Apple-[^"]*""#)?,
            surface_root: build(&format!(r"(?i)^<[^<]+{SURFACE_ROOT_ATTR}"))?,
            trailing_br: build(r"(?i)<br ?/?>$")?,
            trident_lead: build(r"^&nbsp;(?: |\r\n)?<(\w+)")?,
            webkit_tail: build(r"</(\w+)><div><br></div>$")?,
            gecko_tail: build(r"(\s)<br>$")?,
        })
    }

    /// Scrubs `value`, reporting flags the sniffing stage needs.
    pub fn scrub(&self, value: &str, forced_html: bool) -> ScrubOutcome {
        let mut out = ScrubOutcome {
            value: value.to_string(),
            ..Default::default()
        };
        let profile = EngineProfile::of(self.family);

        if profile.webkit_like() && out.value.contains("Apple-") {
            self.scrub_apple_artifacts(&mut out, forced_html);
        }

        if self.surface_root.is_match(&out.value) {
            self.strip_surface_wrapper(&mut out);
        }

        match self.family {
            EngineFamily::Trident => {
                // A leading &nbsp; before a block element is IE padding, and
                // proves the content is block markup rather than text.
                if let Some(caps) = self.trident_lead.captures(&out.value) {
                    if categories::is_block(&caps[1].to_ascii_lowercase()) {
                        let tag = format!("<{}", &caps[1]);
                        out.value = self.trident_lead.replace(&out.value, tag.as_str()).into_owned();
                        out.pre_sniffed_html = true;
                    }
                }
            }
            EngineFamily::WebKit | EngineFamily::Blink => {
                // </p><div><br></div> at the end is an encoded trailing line
                // break. Don't mark as pre-sniffed: htmlified text can end
                // the same way.
                if let Some(caps) = self.webkit_tail.captures(&out.value) {
                    if categories::is_block(&caps[1].to_ascii_lowercase()) {
                        let tag = format!("</{}>", &caps[1]);
                        out.value = self.webkit_tail.replace(&out.value, tag.as_str()).into_owned();
                        out.ends_with_break = true;
                    }
                }
            }
            EngineFamily::Gecko => {
                // Bogus <br> after text followed by whitespace.
                if let Some(m) = self.gecko_tail.captures(&out.value) {
                    let ws = m[1].to_string();
                    out.value = self.gecko_tail.replace(&out.value, ws.as_str()).into_owned();
                }
            }
            EngineFamily::Other => {}
        }

        out
    }

    fn scrub_apple_artifacts(&self, out: &mut ScrubOutcome, forced_html: bool) {
        // WebKit produces converted-space spans even for normal spaces.
        out.value = self.converted_space.replace_all(&out.value, " ").into_owned();

        // Tab spans only appear when plain text is pasted; expand the tabs
        // the way other engines do.
        if !forced_html {
            out.value = self
                .tab_span
                .replace_all(&out.value, |caps: &Captures| {
                    caps[1].replace('\t', "&nbsp;&nbsp; &nbsp;")
                })
                .into_owned();
        }

        if out.value.contains(INTERCHANGE_NEWLINE) {
            out.starts_with_break = true;
            out.pre_sniffed_html = true;
            out.value = out.value.replacen(INTERCHANGE_NEWLINE, "", 1);
        }

        out.value = self.apple_class.replace_all(&out.value, "$1").into_owned();
    }

    /// Content copied from within another edit surface arrives wrapped in
    /// the surface root element; unwrap it (and the bogus trailing break
    /// some engines add) so only the real content is pasted.
    fn strip_surface_wrapper(&self, out: &mut ScrubOutcome) {
        let nodes = markup::parse(&out.value);

        let mut current: &[Node] = &nodes;
        let mut wrapper = None;
        loop {
            let mut significant = current
                .iter()
                .filter(|n| !matches!(n, Node::Text(t) if t.trim().is_empty()));
            match (significant.next(), significant.next()) {
                (Some(Node::Element(el)), None) if el.has_attr(SURFACE_ROOT_ATTR) => {
                    wrapper = Some(el);
                    current = &el.children;
                }
                _ => break,
            }
        }

        if let Some(wrapper) = wrapper {
            let inner = markup::write_nodes(&wrapper.children);
            out.value = self.trailing_br.replace(&inner, "").into_owned();
        }
    }
}
