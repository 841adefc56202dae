/// The shared record one paste gesture mutates through the stage pipeline.
use clipflow_mod_transfer::TransferHandle;

/// Semantic type of the value being pasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Not yet recognized; must be resolved before insertion.
    Auto,
    Text,
    Html,
}

/// How the content reached the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Paste,
    Drop,
}

/// Out-of-band facts upstream stages record for the sniffing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFlags {
    /// Scrubbing proved the content is HTML; skip recognition.
    pub forced_html_before_sniff: bool,
    /// A leading line break was encoded outside the value.
    pub prepend_break: bool,
    /// A trailing line break was encoded outside the value.
    pub append_break: bool,
}

/// The single in-flight record of one paste/drop gesture.
///
/// Exactly one exists per gesture; stages mutate it in tier order and may
/// only refine `value`, `content_type` and `flags`, never unwind earlier
/// stages. Once the sniffing stage ran, `content_type` is `Text` or `Html`
/// and `value` is canonical HTML either way.
#[derive(Debug)]
pub struct PasteRecord {
    pub content_type: ContentType,
    pub value: String,
    pub transfer: TransferHandle,
    pub method: Method,
    pub flags: RecordFlags,
}

impl PasteRecord {
    pub fn new(transfer: TransferHandle, method: Method) -> Self {
        Self {
            content_type: ContentType::Auto,
            value: String::new(),
            transfer,
            method,
            flags: RecordFlags::default(),
        }
    }

    pub fn with_value(transfer: TransferHandle, method: Method, value: String) -> Self {
        Self {
            value,
            ..Self::new(transfer, method)
        }
    }
}

/// What a clipboard capture request hands back: the raw value and the type
/// as far as the pre-classification hooks determined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub content_type: ContentType,
    pub value: String,
}
