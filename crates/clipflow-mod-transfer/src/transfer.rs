/// Facade over one gesture's transfer carrier.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use uuid::Uuid;

use clipflow_config::{EngineFamily, EngineProfile};

use crate::key::DataKey;
use crate::native::{decode_slot_bytes, FileHandle, NativeDataSource, SlotPayload};

/// Identity of one edit-surface instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Token binding the transfer objects created for one user gesture.
///
/// On carriers without custom data types the token degrades to the plain
/// text payload itself: any nonempty dragged text correlates, and dragging
/// empty text yields the empty token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    fn generate() -> Self {
        Self(format!("cf-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Relationship between a transfer's origin and its destination surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    /// Started and ended on the same surface instance.
    Internal,
    /// Started on a different instance of the same kind of surface.
    CrossSurface,
    /// No known originating surface (another application, a file manager).
    External,
}

struct Inner {
    profile: EngineProfile,
    token: CorrelationToken,
    source: Option<SurfaceId>,
    data: BTreeMap<DataKey, String>,
    files: Vec<FileHandle>,
    native: Option<Box<dyn NativeDataSource>>,
}

/// Uniform get/set facade over a native transfer carrier.
///
/// Cloning is shallow: clones share the cache and carrier, the way every
/// event in one gesture observes one logical transfer object.
#[derive(Clone)]
pub struct TransferHandle {
    inner: Rc<RefCell<Inner>>,
}

impl TransferHandle {
    /// Wraps a native carrier (or nothing, for synthetic transfers).
    ///
    /// Reads the gesture token off the carrier if an earlier event stored
    /// one; otherwise mints a token and, where the carrier allows custom
    /// entries, stores it for the paired event to find.
    pub fn new(native: Option<Box<dyn NativeDataSource>>, profile: EngineProfile) -> Self {
        let mut inner = Inner {
            profile,
            token: CorrelationToken(String::new()),
            source: None,
            data: BTreeMap::new(),
            files: Vec::new(),
            native,
        };

        let token_key = Self::token_key(&profile);
        let existing = read_slot(&inner, &token_key);
        if existing.is_empty() {
            if profile.custom_data_types {
                inner.token = CorrelationToken::generate();
                if let Some(native) = inner.native.as_mut() {
                    if let Err(e) = native.set(&token_key, &inner.token.0) {
                        tracing::debug!("could not store correlation token: {e}");
                    }
                }
            }
            // Degraded carriers keep the empty token; an empty drag payload
            // still correlates with an empty drop payload.
        } else {
            inner.token = CorrelationToken(existing);
        }

        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    fn token_key(profile: &EngineProfile) -> DataKey {
        if profile.custom_data_types {
            DataKey::correlation()
        } else {
            DataKey::text()
        }
    }

    pub fn token(&self) -> CorrelationToken {
        self.inner.borrow().token.clone()
    }

    pub fn source(&self) -> Option<SurfaceId> {
        self.inner.borrow().source
    }

    /// Declares the surface that authored this transfer and seeds the
    /// content slots from its selection. The plain-text slot is only filled
    /// where it does not clobber the degraded correlation token.
    pub fn attach_source(&self, id: SurfaceId, selected_html: &str, selected_text: &str) {
        let custom = {
            let mut inner = self.inner.borrow_mut();
            inner.source = Some(id);
            inner.profile.custom_data_types
        };
        self.set_data(&DataKey::html(), selected_html);
        if custom && self.get_data(&DataKey::text()).is_empty() {
            self.set_data(&DataKey::text(), selected_text);
        }
    }

    /// Swaps in the carrier from a later event of the same gesture. The old
    /// carrier may already be unreadable; the cache survives.
    pub fn rebind_native(&self, native: Box<dyn NativeDataSource>) {
        self.inner.borrow_mut().native = Some(native);
    }

    /// Reads a slot, preferring the snapshot cache. Returns an empty string
    /// for missing slots.
    pub fn get_data(&self, key: &DataKey) -> String {
        read_slot(&self.inner.borrow(), key)
    }

    /// Writes a slot to the cache and, where representable, to the carrier.
    pub fn set_data(&self, key: &DataKey, value: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.data.insert(key.clone(), value.to_string());

        // Degraded carriers only represent the text and URL slots.
        if !inner.profile.custom_data_types && *key != DataKey::text() && *key != DataKey::url() {
            return;
        }
        if let Some(native) = inner.native.as_mut() {
            if let Err(e) = native.set(key, value) {
                tracing::debug!("carrier rejected {key}: {e}");
            }
        }
    }

    /// Snapshots every enumerable slot and file into the cache while the
    /// carrier is still readable. Later reads are answered from the cache
    /// even after the carrier is invalidated.
    pub fn cache_data(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.native.is_none() {
            return;
        }

        let keys: Vec<DataKey> = if inner.profile.custom_data_types {
            inner.native.as_ref().map(|n| n.keys()).unwrap_or_default()
        } else {
            vec![DataKey::text(), DataKey::url()]
        };
        for key in keys {
            let value = read_slot(&inner, &key);
            if !value.is_empty() {
                inner.data.insert(key, value);
            }
        }

        let mut files = inner
            .native
            .as_ref()
            .map(|n| n.files())
            .unwrap_or_default();
        if let Some(extra) = inner.native.as_ref().and_then(|n| n.item_file()) {
            files.push(extra);
        }
        if !files.is_empty() {
            inner.files = files;
        }
    }

    pub fn files_count(&self) -> usize {
        let inner = self.inner.borrow();
        if !inner.files.is_empty() {
            return inner.files.len();
        }
        match inner.native.as_ref() {
            Some(native) => {
                let count = native.files().len();
                if count > 0 {
                    count
                } else {
                    usize::from(native.item_file().is_some())
                }
            }
            None => 0,
        }
    }

    pub fn file(&self, index: usize) -> Option<FileHandle> {
        let inner = self.inner.borrow();
        if !inner.files.is_empty() {
            return inner.files.get(index).cloned();
        }
        match inner.native.as_ref() {
            Some(native) => {
                let files = native.files();
                if !files.is_empty() {
                    files.get(index).cloned()
                } else if index == 0 {
                    native.item_file()
                } else {
                    None
                }
            }
            None => None,
        }
    }

    /// True when the transfer carries no data and no files. The correlation
    /// slot does not count as data.
    pub fn is_empty(&self) -> bool {
        if self.files_count() > 0 {
            return false;
        }

        let inner = self.inner.borrow();
        let mut keys: Vec<DataKey> = inner.data.keys().cloned().collect();
        if inner.profile.custom_data_types {
            if let Some(native) = inner.native.as_ref() {
                keys.extend(native.keys());
            }
            keys.retain(|k| *k != DataKey::correlation());
        } else {
            keys.push(DataKey::text());
            keys.push(DataKey::url());
        }

        keys.iter().all(|key| read_slot(&inner, key).is_empty())
    }

    /// Classifies this transfer relative to the surface receiving it.
    pub fn transfer_type(&self, target: SurfaceId) -> TransferType {
        match self.inner.borrow().source {
            None => TransferType::External,
            Some(source) if source == target => TransferType::Internal,
            Some(_) => TransferType::CrossSurface,
        }
    }
}

impl std::fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TransferHandle")
            .field("token", &inner.token)
            .field("source", &inner.source)
            .field("cached_keys", &inner.data.keys().collect::<Vec<_>>())
            .field("files", &inner.files.len())
            .finish()
    }
}

/// Cache-first slot read with the per-engine envelope scrubbing the carrier
/// formats force on us.
fn read_slot(inner: &Inner, key: &DataKey) -> String {
    let mut data = match inner.data.get(key) {
        Some(cached) if !cached.is_empty() => cached.clone(),
        _ => match inner.native.as_ref().and_then(|n| n.get(key)) {
            Some(SlotPayload::Text(text)) => text,
            Some(SlotPayload::Bytes(bytes)) => decode_slot_bytes(&bytes),
            None => String::new(),
        },
    };
    if data.is_empty() {
        return data;
    }

    if *key == DataKey::html() && inner.profile.family == EngineFamily::Blink {
        data = strip_html_envelope(&data);
    } else if *key == DataKey::text()
        && inner.profile.family == EngineFamily::Gecko
        && data.starts_with("file://")
        && has_files(inner)
    {
        // File paths leak into the text slot when files are dragged; files
        // are only handled when there is no markup/text payload, so hide
        // the paths.
        data = String::new();
    }

    data
}

fn has_files(inner: &Inner) -> bool {
    if !inner.files.is_empty() {
        return true;
    }
    match inner.native.as_ref() {
        Some(native) => !native.files().is_empty() || native.item_file().is_some(),
        None => false,
    }
}

/// Blink wraps clipboard HTML in a `<meta>` prefix on some platforms and a
/// StartFragment/EndFragment comment envelope on others.
fn strip_html_envelope(data: &str) -> String {
    let mut data = data.to_string();
    if data.starts_with("<meta") {
        if let Some(end) = data.find('>') {
            data = data[end + 1..].to_string();
        }
    }
    if let (Some(start), Some(end)) = (data.find("<!--StartFragment-->"), data.rfind("<!--EndFragment-->")) {
        let content_start = start + "<!--StartFragment-->".len();
        if content_start <= end {
            data = data[content_start..end].to_string();
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::TransferError;

    /// Carrier backed by plain maps; `invalidate` simulates the platform
    /// reclaiming the object after the event returns.
    #[derive(Default)]
    struct MemoryCarrier {
        slots: BTreeMap<DataKey, SlotPayload>,
        files: Vec<FileHandle>,
        item: Option<FileHandle>,
        invalidated: bool,
        reject_custom: bool,
    }

    impl MemoryCarrier {
        fn with_text(text: &str) -> Self {
            let mut carrier = Self::default();
            carrier
                .slots
                .insert(DataKey::text(), SlotPayload::Text(text.to_string()));
            carrier
        }
    }

    impl NativeDataSource for MemoryCarrier {
        fn get(&self, key: &DataKey) -> Option<SlotPayload> {
            if self.invalidated {
                return None;
            }
            self.slots.get(key).cloned()
        }

        fn set(&mut self, key: &DataKey, value: &str) -> Result<(), TransferError> {
            if self.reject_custom && key.as_str().starts_with("application/") {
                return Err(TransferError::UnsupportedType(key.to_string()));
            }
            self.slots
                .insert(key.clone(), SlotPayload::Text(value.to_string()));
            Ok(())
        }

        fn keys(&self) -> Vec<DataKey> {
            if self.invalidated {
                return Vec::new();
            }
            self.slots.keys().cloned().collect()
        }

        fn files(&self) -> Vec<FileHandle> {
            if self.invalidated {
                return Vec::new();
            }
            self.files.clone()
        }

        fn item_file(&self) -> Option<FileHandle> {
            if self.invalidated {
                None
            } else {
                self.item.clone()
            }
        }
    }

    fn profile(family: EngineFamily) -> EngineProfile {
        EngineProfile::of(family)
    }

    #[test]
    fn test_get_data_reads_native() {
        let carrier = MemoryCarrier::with_text("hello");
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(handle.get_data(&DataKey::new("Text")), "hello");
    }

    #[test]
    fn test_cache_survives_invalidation() {
        let carrier = MemoryCarrier::with_text("payload");
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        handle.cache_data();
        let before = handle.get_data(&DataKey::text());

        // Simulate the platform reclaiming the carrier.
        handle.rebind_native(Box::new(MemoryCarrier {
            invalidated: true,
            ..Default::default()
        }));

        assert_eq!(handle.get_data(&DataKey::text()), before);
        assert_eq!(before, "payload");
    }

    #[test]
    fn test_token_roundtrips_through_carrier() {
        let mut carrier = MemoryCarrier::default();
        let first = TransferHandle::new(None, profile(EngineFamily::Blink));
        // Store the first handle's token on a fresh carrier the way a drag
        // start would.
        carrier
            .slots
            .insert(
                DataKey::correlation(),
                SlotPayload::Text(first.token().as_str().to_string()),
            );
        let second = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(first.token(), second.token());
    }

    #[test]
    fn test_degraded_token_is_text_payload() {
        let carrier = MemoryCarrier::with_text("dragged words");
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Trident));
        assert_eq!(handle.token().as_str(), "dragged words");

        let empty = TransferHandle::new(None, profile(EngineFamily::Trident));
        assert_eq!(empty.token().as_str(), "");
    }

    #[test]
    fn test_transfer_type() {
        let a = SurfaceId::new();
        let b = SurfaceId::new();

        let handle = TransferHandle::new(None, profile(EngineFamily::Blink));
        assert_eq!(handle.transfer_type(a), TransferType::External);

        handle.attach_source(a, "<b>x</b>", "x");
        assert_eq!(handle.transfer_type(a), TransferType::Internal);
        assert_eq!(handle.transfer_type(b), TransferType::CrossSurface);
    }

    #[test]
    fn test_attach_source_seeds_slots() {
        let handle = TransferHandle::new(None, profile(EngineFamily::Blink));
        handle.attach_source(SurfaceId::new(), "<b>sel</b>", "sel");
        assert_eq!(handle.get_data(&DataKey::html()), "<b>sel</b>");
        assert_eq!(handle.get_data(&DataKey::text()), "sel");
    }

    #[test]
    fn test_is_empty() {
        let handle = TransferHandle::new(None, profile(EngineFamily::Blink));
        assert!(handle.is_empty());

        handle.set_data(&DataKey::text(), "x");
        assert!(!handle.is_empty());
    }

    #[test]
    fn test_correlation_slot_does_not_count_as_data() {
        let carrier = MemoryCarrier::default();
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        // The constructor stored the token on the carrier; nothing else.
        assert!(handle.is_empty());
    }

    #[test]
    fn test_files_counted_as_content() {
        let mut carrier = MemoryCarrier::default();
        carrier.files.push(FileHandle {
            name: "a.png".into(),
            media_type: "image/png".into(),
            bytes: vec![1, 2],
        });
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert!(!handle.is_empty());
        assert_eq!(handle.files_count(), 1);
        assert_eq!(handle.file(0).map(|f| f.name), Some("a.png".to_string()));
    }

    #[test]
    fn test_item_file_fallback() {
        let mut carrier = MemoryCarrier::default();
        carrier.item = Some(FileHandle {
            name: "pasted.png".into(),
            media_type: "image/png".into(),
            bytes: vec![7],
        });
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(handle.files_count(), 1);
        assert_eq!(handle.file(0).map(|f| f.name), Some("pasted.png".to_string()));
        assert_eq!(handle.file(1), None);
    }

    #[test]
    fn test_blink_html_envelope_stripped() {
        let mut carrier = MemoryCarrier::default();
        carrier.slots.insert(
            DataKey::html(),
            SlotPayload::Text(
                "<meta http-equiv=\"content-type\" content=\"text/html\"><b>x</b>".to_string(),
            ),
        );
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(handle.get_data(&DataKey::html()), "<b>x</b>");
    }

    #[test]
    fn test_blink_fragment_envelope_stripped() {
        let mut carrier = MemoryCarrier::default();
        carrier.slots.insert(
            DataKey::html(),
            SlotPayload::Text(
                "<html><body><!--StartFragment--><p>x</p><!--EndFragment--></body></html>"
                    .to_string(),
            ),
        );
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(handle.get_data(&DataKey::html()), "<p>x</p>");
    }

    #[test]
    fn test_gecko_file_path_hidden_when_files_present() {
        let mut carrier = MemoryCarrier::with_text("file:///tmp/a.png");
        carrier.files.push(FileHandle {
            name: "a.png".into(),
            media_type: "image/png".into(),
            bytes: vec![],
        });
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Gecko));
        assert_eq!(handle.get_data(&DataKey::text()), "");
    }

    #[test]
    fn test_byte_slot_decoded() {
        let mut carrier = MemoryCarrier::default();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "wide".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        carrier
            .slots
            .insert(DataKey::text(), SlotPayload::Bytes(bytes));
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Blink));
        assert_eq!(handle.get_data(&DataKey::text()), "wide");
    }

    #[test]
    fn test_set_data_skips_unrepresentable_keys_on_degraded_carrier() {
        let carrier = MemoryCarrier::default();
        let handle = TransferHandle::new(Some(Box::new(carrier)), profile(EngineFamily::Trident));
        handle.set_data(&DataKey::html(), "<b>x</b>");
        // Cached locally even though the carrier can't hold it.
        assert_eq!(handle.get_data(&DataKey::html()), "<b>x</b>");
    }
}
