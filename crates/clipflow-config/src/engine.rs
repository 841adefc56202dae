/// Rendering-engine families and their static capability profiles.
use serde::{Deserialize, Serialize};

/// The family of rendering engine hosting the edit surface.
///
/// Declared by the host, never detected at runtime. Each family carries a
/// fixed set of quirk-compensation rules; adding a family means adding one
/// profile entry here and one pattern row in the content classifier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineFamily {
    /// Safari and other WebKit-derived engines.
    WebKit,
    /// Chromium-derived engines. Shares WebKit's paste artifacts but
    /// guarantees HTML availability in the transfer object.
    #[default]
    Blink,
    /// Firefox.
    Gecko,
    /// Legacy Internet Explorer engines.
    Trident,
    /// Anything else: no htmlified-text shapes are recognized.
    Other,
}

impl std::fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebKit => write!(f, "webkit"),
            Self::Blink => write!(f, "blink"),
            Self::Gecko => write!(f, "gecko"),
            Self::Trident => write!(f, "trident"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One tier of the drop-caret resolution fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropStrategy {
    /// Direct position-from-point API.
    CaretFromPoint,
    /// Temporary marker-insertion probe, retried vertically around the point.
    MarkerProbe,
    /// Compare the pointer x coordinate against the hit element's box.
    ElementBox,
    /// Fall back to the surface's cached selection.
    CachedSelection,
}

/// Static capability table for one engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProfile {
    pub family: EngineFamily,
    /// Clipboard data can be read directly inside the paste signal. When
    /// false the orchestrator must fall back to the capture-buffer technique.
    pub data_available_in_paste: bool,
    /// Custom keys can be stored on the native carrier. When false the
    /// correlation token degrades to reusing the plain-text slot.
    pub custom_data_types: bool,
    /// File enumeration is supported on the native carrier.
    pub file_api: bool,
    /// HTML present natively is always readable through `get_data`, so a
    /// missing HTML slot proves there is no HTML at all.
    pub html_always_in_transfer: bool,
    /// The engine keeps a block-final line break visible on its own; when
    /// false the text normalizer doubles it.
    pub compensates_trailing_break: bool,
    /// The engine may split a text node at the drop point, invalidating the
    /// drag range; the coordinator must rejoin before computing positions.
    pub splits_text_node_on_drop: bool,
    /// Ordered drop-caret resolution tiers for this family.
    pub drop_strategies: &'static [DropStrategy],
}

impl EngineProfile {
    /// Returns the capability profile for `family`.
    pub fn of(family: EngineFamily) -> Self {
        use DropStrategy::*;
        match family {
            EngineFamily::WebKit => Self {
                family,
                data_available_in_paste: true,
                custom_data_types: true,
                file_api: true,
                html_always_in_transfer: false,
                compensates_trailing_break: false,
                splits_text_node_on_drop: false,
                drop_strategies: &[CaretFromPoint, CachedSelection],
            },
            EngineFamily::Blink => Self {
                family,
                data_available_in_paste: true,
                custom_data_types: true,
                file_api: true,
                html_always_in_transfer: true,
                compensates_trailing_break: false,
                splits_text_node_on_drop: false,
                drop_strategies: &[CaretFromPoint, CachedSelection],
            },
            EngineFamily::Gecko => Self {
                family,
                data_available_in_paste: true,
                custom_data_types: true,
                file_api: true,
                html_always_in_transfer: false,
                compensates_trailing_break: false,
                splits_text_node_on_drop: false,
                drop_strategies: &[CaretFromPoint, CachedSelection],
            },
            EngineFamily::Trident => Self {
                family,
                data_available_in_paste: false,
                custom_data_types: false,
                file_api: false,
                html_always_in_transfer: false,
                compensates_trailing_break: true,
                splits_text_node_on_drop: true,
                drop_strategies: &[CachedSelection, MarkerProbe, ElementBox],
            },
            EngineFamily::Other => Self {
                family,
                data_available_in_paste: true,
                custom_data_types: true,
                file_api: true,
                html_always_in_transfer: false,
                compensates_trailing_break: false,
                splits_text_node_on_drop: false,
                drop_strategies: &[CaretFromPoint, CachedSelection],
            },
        }
    }

    /// True when this family shares the WebKit div-wrapping paste artifacts.
    pub fn webkit_like(&self) -> bool {
        matches!(self.family, EngineFamily::WebKit | EngineFamily::Blink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup_is_total() {
        for family in [
            EngineFamily::WebKit,
            EngineFamily::Blink,
            EngineFamily::Gecko,
            EngineFamily::Trident,
            EngineFamily::Other,
        ] {
            let profile = EngineProfile::of(family);
            assert_eq!(profile.family, family);
            assert!(!profile.drop_strategies.is_empty());
        }
    }

    #[test]
    fn test_trident_degrades_capture_and_correlation() {
        let profile = EngineProfile::of(EngineFamily::Trident);
        assert!(!profile.data_available_in_paste);
        assert!(!profile.custom_data_types);
        assert!(profile.splits_text_node_on_drop);
    }

    #[test]
    fn test_blink_is_webkit_like() {
        assert!(EngineProfile::of(EngineFamily::Blink).webkit_like());
        assert!(EngineProfile::of(EngineFamily::WebKit).webkit_like());
        assert!(!EngineProfile::of(EngineFamily::Gecko).webkit_like());
    }

    #[test]
    fn test_family_serde_names() {
        let json = serde_json::to_string(&EngineFamily::Blink).unwrap();
        assert_eq!(json, "\"blink\"");
        let back: EngineFamily = serde_json::from_str("\"trident\"").unwrap();
        assert_eq!(back, EngineFamily::Trident);
    }
}
