/// Content-type recognition for pasted data.
use anyhow::{Context, Result};
use regex::Regex;

use clipflow_config::EngineFamily;

/// Upstream hints that short-circuit recognition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SniffFlags {
    /// The caller already declared the content to be HTML.
    pub forced_html: bool,
    /// An upstream filter proved the content is HTML (e.g. it carried an
    /// interchange-newline marker).
    pub pre_sniffed_html: bool,
}

/// What a raw pasted string turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Plain text with no markup at all.
    Text,
    /// Plain text that the engine wrapped in minimal markup as a paste
    /// artifact (bare divs, doubled breaks).
    HtmlifiedText,
    /// Genuine rich HTML.
    Html,
}

/// Recognizes the narrow markup shapes a given engine family produces when
/// plain text is pasted into an editable region.
///
/// Each family contributes a fixed pattern row; content matching any row is
/// htmlified text, anything else with markup is genuine HTML. Recognition is
/// total and deterministic.
#[derive(Debug)]
pub struct Classifier {
    patterns: Vec<Regex>,
    entity: Regex,
}

impl Classifier {
    /// Builds the recognizer for the declared engine family.
    pub fn new(family: EngineFamily) -> Result<Self> {
        let sources: &[&str] = match family {
            // Plain text, or <div><br></div> groups and text inside <div>.
            EngineFamily::WebKit | EngineFamily::Blink => &[
                r"^[^<]*$",
                r"(?i)^(<div><br( ?/)?></div>|<div>[^<]*</div>)*$",
            ],
            // Text and <br>, or text and <br> inside <p> with paragraphs
            // separated by CRLF.
            EngineFamily::Trident => &[
                r"(?i)^([^<]|<br( ?/)?>)*$",
                r"(?i)^(<p>([^<]|<br( ?/)?>)*</p>|(\r\n))*$",
            ],
            // Text and <br> only.
            EngineFamily::Gecko => &[r"(?i)^([^<]|<br( ?/)?>)*$"],
            EngineFamily::Other => &[],
        };

        let patterns = sources
            .iter()
            .map(|src| Regex::new(src).with_context(|| format!("invalid sniff pattern: {src}")))
            .collect::<Result<Vec<_>>>()?;

        let entity = Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#x[0-9a-fA-F]+);")
            .context("invalid entity pattern")?;

        Ok(Self { patterns, entity })
    }

    /// Classifies a raw pasted string.
    pub fn classify(&self, raw: &str, flags: SniffFlags) -> Classification {
        if flags.forced_html || flags.pre_sniffed_html {
            return Classification::Html;
        }
        if !raw.contains('<') && !self.entity.is_match(raw) {
            return Classification::Text;
        }
        if self.patterns.iter().any(|p| p.is_match(raw)) {
            Classification::HtmlifiedText
        } else {
            Classification::Html
        }
    }
}
