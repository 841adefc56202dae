/// Pipeline configuration: load, save, and sanitize.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineFamily;

/// Content type assumed when pasted data cannot be recognized either way.
///
/// `"foo"` may come from a plain-text editor or from a web page; only the
/// host can say which reading it prefers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultContentType {
    #[default]
    Html,
    Text,
}

/// How paragraph breaks are represented in canonical output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    /// A paragraph break opens a new `<p>` element.
    #[default]
    Paragraph,
    /// A paragraph break opens a new `<div>` element.
    Div,
    /// No block wrapping; every line break is a `<br>`.
    #[serde(rename = "br")]
    BreakOnly,
}

impl BlockMode {
    /// The block tag produced in this mode, if any.
    pub fn block_tag(&self) -> Option<&'static str> {
        match self {
            Self::Paragraph => Some("p"),
            Self::Div => Some("div"),
            Self::BreakOnly => None,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Declared rendering-engine family of the host surface.
    pub engine_family: EngineFamily,
    /// Fallback type for content that is neither clearly text nor HTML.
    pub default_content_type: DefaultContentType,
    /// Block-separator representation for normalized output.
    pub block_mode: BlockMode,
    /// Seconds after which an unmatched drag gesture is evicted from the
    /// session registry (minimum 5).
    pub stale_drag_secs: u64,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            engine_family: EngineFamily::default(),
            default_content_type: DefaultContentType::Html,
            block_mode: BlockMode::Paragraph,
            stale_drag_secs: 60,
        }
    }
}

impl PasteConfig {
    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<PasteConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps out-of-range values.
    pub fn sanitize(&mut self) {
        if self.stale_drag_secs < 5 {
            self.stale_drag_secs = 5;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PasteConfig::default();
        assert_eq!(config.default_content_type, DefaultContentType::Html);
        assert_eq!(config.block_mode, BlockMode::Paragraph);
        assert_eq!(config.stale_drag_secs, 60);
    }

    #[test]
    fn test_block_tag() {
        assert_eq!(BlockMode::Paragraph.block_tag(), Some("p"));
        assert_eq!(BlockMode::Div.block_tag(), Some("div"));
        assert_eq!(BlockMode::BreakOnly.block_tag(), None);
    }

    #[test]
    fn test_sanitize_clamps_stale_secs() {
        let mut config = PasteConfig {
            stale_drag_secs: 0,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.stale_drag_secs, 5);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = PasteConfig {
            engine_family: EngineFamily::Gecko,
            default_content_type: DefaultContentType::Text,
            block_mode: BlockMode::BreakOnly,
            stale_drag_secs: 30,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PasteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.engine_family, EngineFamily::Gecko);
        assert_eq!(back.block_mode, BlockMode::BreakOnly);
    }

    #[test]
    fn test_block_mode_br_rename() {
        let json = serde_json::to_string(&BlockMode::BreakOnly).unwrap();
        assert_eq!(json, "\"br\"");
    }
}
