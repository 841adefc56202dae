/// Normalized data-slot keys.

/// A normalized key naming one data slot on a transfer carrier.
///
/// Common aliases collapse to one canonical key (`text`/`text/plain` and
/// `url` respectively); everything else passes through lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataKey(String);

/// Slot carrying the gesture correlation token on carriers that support
/// custom entries.
const CORRELATION: &str = "application/x-clipflow-id";

impl DataKey {
    pub fn new(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        match lower.as_str() {
            "text" | "text/plain" => Self::text(),
            "url" => Self::url(),
            _ => Self(lower),
        }
    }

    /// Canonical plain-text slot.
    pub fn text() -> Self {
        Self("text/plain".to_string())
    }

    /// Canonical HTML slot.
    pub fn html() -> Self {
        Self("text/html".to_string())
    }

    /// Canonical URL slot.
    pub fn url() -> Self {
        Self("text/uri-list".to_string())
    }

    /// Correlation-token slot.
    pub fn correlation() -> Self {
        Self(CORRELATION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
