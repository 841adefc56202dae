/// Port to the platform's transfer carrier, plus byte-slot decoding.
use thiserror::Error;

use crate::key::DataKey;

/// Failures surfaced by a native carrier.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("carrier does not support data type {0}")]
    UnsupportedType(String),
    #[error("native data source is no longer readable")]
    SourceInvalidated,
}

/// A file entry enumerated from a transfer carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Raw value of one data slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPayload {
    Text(String),
    /// Bytes in an undeclared platform encoding; see [`decode_slot_bytes`].
    Bytes(Vec<u8>),
}

/// The native clipboard/drag object backing one gesture.
///
/// Implementations are only required to be readable synchronously within the
/// event that produced them; [`crate::TransferHandle::cache_data`] snapshots
/// everything before that window closes. All methods are best-effort: a
/// carrier that has become unreadable returns empty results rather than
/// panicking.
pub trait NativeDataSource {
    fn get(&self, key: &DataKey) -> Option<SlotPayload>;

    /// Stores a value. Carriers reject keys they cannot represent.
    fn set(&mut self, key: &DataKey, value: &str) -> Result<(), TransferError>;

    /// Keys currently enumerable on the carrier.
    fn keys(&self) -> Vec<DataKey>;

    fn files(&self) -> Vec<FileHandle>;

    /// Some carriers expose a pasted file only through their item list while
    /// reporting an empty file list; this is that fallback slot.
    fn item_file(&self) -> Option<FileHandle> {
        None
    }
}

/// Decodes a byte slot into a string.
///
/// Byte slots come from carriers that do not declare an encoding: BOMs are
/// honored first, then valid UTF-8 is taken as-is, and anything else goes
/// through charset detection. Decoding is lossy by design; clipboard content
/// is not worth failing a paste over.
pub fn decode_slot_bytes(bytes: &[u8]) -> String {
    if let Some(content) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(content, u16::from_le_bytes);
    }
    if let Some(content) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(content, u16::from_be_bytes);
    }
    let content = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(content) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(content, true);
            let encoding = detector.guess(None, true);
            let (decoded, _, _) = encoding.decode(content);
            decoded.into_owned()
        }
    }
}

fn decode_utf16(content: &[u8], from_bytes: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = content
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
