//! In-memory reference implementations of the host-facing traits.
//!
//! `MemorySurface` keeps its document in a rope and treats character offsets
//! as the range space, which is exactly the contract [`EditSurface`]
//! promises. It backs the demo binary and the integration tests; a real host
//! wires these traits to its engine instead.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use ropey::Rope;

use clipflow_config::PasteConfig;
use clipflow_mod_transfer::{DataKey, FileHandle, NativeDataSource, SlotPayload, SurfaceId, TransferError};

use crate::surface::{
    Bookmark, CaptureBufferId, ClipboardOp, CommandOutcome, DocRange, EditSurface, Notifier,
    PasteDialog, SemanticType,
};

/// A recorded insertion, for assertions and the demo printout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub html: String,
    pub semantic: SemanticType,
    pub at: usize,
}

/// Rope-backed edit surface.
///
/// Markup is stored verbatim (no rendering); selections, bookmarks and
/// capture buffers behave like the real thing, including offset adjustment
/// under mutation.
pub struct MemorySurface {
    id: SurfaceId,
    config: PasteConfig,
    text: Rope,
    read_only: bool,
    selection: Option<DocRange>,
    bookmarks: HashMap<u64, DocRange>,
    next_bookmark: u64,
    capture: Option<(CaptureBufferId, Option<String>)>,
    next_buffer: u64,
    /// What a redirected native paste will deposit into the capture buffer.
    pub pending_capture: Option<String>,
    /// What `caret_from_point` resolves to, regardless of the point.
    pub caret_point_result: Option<DocRange>,
    /// Outcomes for `exec_native_command`, keyed by operation.
    pub command_support: fn(ClipboardOp) -> bool,
    pub insertions: Vec<Insertion>,
    pub undo_snapshots: usize,
    pub undo_groups_open: i32,
}

impl MemorySurface {
    pub fn new(config: PasteConfig, content: &str) -> Self {
        Self {
            id: SurfaceId::new(),
            config,
            text: Rope::from_str(content),
            read_only: false,
            selection: None,
            bookmarks: HashMap::new(),
            next_bookmark: 0,
            capture: None,
            next_buffer: 0,
            pending_capture: None,
            caret_point_result: None,
            command_support: |_| false,
            insertions: Vec::new(),
            undo_snapshots: 0,
            undo_groups_open: 0,
        }
    }

    pub fn content(&self) -> String {
        self.text.to_string()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Finds `needle` in the document and returns its range.
    pub fn find(&self, needle: &str) -> Option<DocRange> {
        self.content().find(needle).map(|byte_at| {
            let start = self.text.byte_to_char(byte_at);
            DocRange::new(start, start + needle.chars().count())
        })
    }

    fn remove_span(&mut self, range: DocRange) -> String {
        let removed: String = self.text.slice(range.start..range.end).to_string();
        self.text.remove(range.start..range.end);
        let len = range.len();

        for anchored in self.bookmarks.values_mut() {
            *anchored = adjust_for_removal(*anchored, range, len);
        }
        if let Some(selection) = self.selection {
            self.selection = Some(adjust_for_removal(selection, range, len));
        }
        removed
    }

    fn insert_span(&mut self, at: usize, content: &str) {
        self.text.insert(at, content);
        let len = content.chars().count();

        for anchored in self.bookmarks.values_mut() {
            *anchored = adjust_for_insertion(*anchored, at, len);
        }
    }
}

fn adjust_for_removal(range: DocRange, removed: DocRange, len: usize) -> DocRange {
    let shift = |pos: usize| {
        if pos <= removed.start {
            pos
        } else if pos >= removed.end {
            pos - len
        } else {
            removed.start
        }
    };
    DocRange::new(shift(range.start), shift(range.end))
}

fn adjust_for_insertion(range: DocRange, at: usize, len: usize) -> DocRange {
    let shift = |pos: usize| if pos >= at { pos + len } else { pos };
    DocRange::new(shift(range.start), shift(range.end))
}

impl EditSurface for MemorySurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn config(&self) -> &PasteConfig {
        &self.config
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn selection(&self) -> Option<DocRange> {
        self.selection
    }

    fn select(&mut self, range: DocRange) {
        self.selection = Some(range);
    }

    fn selected_html(&self) -> String {
        self.selected_text()
    }

    fn selected_text(&self) -> String {
        match self.selection {
            Some(range) => self.text.slice(range.start..range.end).to_string(),
            None => String::new(),
        }
    }

    fn create_bookmark(&mut self, range: DocRange) -> Bookmark {
        let id = self.next_bookmark;
        self.next_bookmark += 1;
        self.bookmarks.insert(id, range);
        Bookmark(id)
    }

    fn resolve_bookmark(&mut self, bookmark: Bookmark) -> Option<DocRange> {
        self.bookmarks.remove(&bookmark.0)
    }

    fn extract_range(&mut self, range: DocRange) -> String {
        self.remove_span(range)
    }

    fn insert_html(&mut self, html: &str, semantic: SemanticType) {
        let at = match self.selection.take() {
            Some(range) => {
                self.remove_span(range);
                range.start
            }
            None => self.text.len_chars(),
        };
        self.insert_span(at, html);
        self.selection = Some(DocRange::caret(at + html.chars().count()));
        self.insertions.push(Insertion {
            html: html.to_string(),
            semantic,
            at,
        });
    }

    fn save_undo_snapshot(&mut self) {
        self.undo_snapshots += 1;
    }

    fn begin_undo_group(&mut self) {
        self.undo_groups_open += 1;
    }

    fn end_undo_group(&mut self) {
        self.undo_groups_open -= 1;
    }

    fn exec_native_command(&mut self, op: ClipboardOp) -> CommandOutcome {
        if (self.command_support)(op) {
            CommandOutcome::Performed(None)
        } else {
            CommandOutcome::Refused
        }
    }

    fn create_capture_buffer(&mut self) -> Option<CaptureBufferId> {
        if self.capture.is_some() {
            return None;
        }
        let id = CaptureBufferId(self.next_buffer);
        self.next_buffer += 1;
        self.capture = Some((id, None));
        Some(id)
    }

    fn focus_capture_buffer(&mut self, buffer: CaptureBufferId) {
        // The native write lands while focus is in the buffer.
        if let Some((id, content)) = self.capture.as_mut() {
            if *id == buffer {
                *content = self.pending_capture.take();
            }
        }
    }

    fn read_capture_buffer(&mut self, buffer: CaptureBufferId) -> Option<String> {
        match &self.capture {
            Some((id, content)) if *id == buffer => content.clone(),
            _ => None,
        }
    }

    fn destroy_capture_buffer(&mut self, buffer: CaptureBufferId) {
        if matches!(self.capture, Some((id, _)) if id == buffer) {
            self.capture = None;
        }
    }

    fn caret_from_point(&self, _point: crate::surface::Point) -> Option<DocRange> {
        self.caret_point_result
    }
}

#[derive(Default)]
struct CarrierStore {
    slots: BTreeMap<DataKey, SlotPayload>,
    files: Vec<FileHandle>,
    invalidated: bool,
}

/// Map-backed native carrier.
///
/// The paired events of one gesture see one underlying store, the way a
/// platform hands the same data object to drag start and drop: [`linked`]
/// produces another carrier over the same store.
///
/// [`linked`]: MemoryDataSource::linked
#[derive(Default, Clone)]
pub struct MemoryDataSource {
    store: std::rc::Rc<RefCell<CarrierStore>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let source = Self::default();
        source.put_text(&DataKey::text(), text);
        source
    }

    pub fn with_html(html: &str) -> Self {
        let source = Self::default();
        source.put_text(&DataKey::html(), html);
        source
    }

    /// Another carrier over the same store, for the paired event of the
    /// same gesture.
    pub fn linked(&self) -> Self {
        self.clone()
    }

    pub fn put_text(&self, key: &DataKey, value: &str) {
        self.store
            .borrow_mut()
            .slots
            .insert(key.clone(), SlotPayload::Text(value.to_string()));
    }

    pub fn put_bytes(&self, key: &DataKey, bytes: Vec<u8>) {
        self.store
            .borrow_mut()
            .slots
            .insert(key.clone(), SlotPayload::Bytes(bytes));
    }

    pub fn push_file(&self, file: FileHandle) {
        self.store.borrow_mut().files.push(file);
    }

    /// Simulates the platform reclaiming the carrier after its event.
    pub fn invalidate(&self) {
        self.store.borrow_mut().invalidated = true;
    }
}

impl NativeDataSource for MemoryDataSource {
    fn get(&self, key: &DataKey) -> Option<SlotPayload> {
        let store = self.store.borrow();
        if store.invalidated {
            return None;
        }
        store.slots.get(key).cloned()
    }

    fn set(&mut self, key: &DataKey, value: &str) -> Result<(), TransferError> {
        if self.store.borrow().invalidated {
            return Err(TransferError::SourceInvalidated);
        }
        self.put_text(key, value);
        Ok(())
    }

    fn keys(&self) -> Vec<DataKey> {
        let store = self.store.borrow();
        if store.invalidated {
            return Vec::new();
        }
        store.slots.keys().cloned().collect()
    }

    fn files(&self) -> Vec<FileHandle> {
        let store = self.store.borrow();
        if store.invalidated {
            return Vec::new();
        }
        store.files.clone()
    }
}

/// Notifier that records alerts instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<ClipboardOp>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, op: ClipboardOp) {
        self.alerts.push(op);
    }
}

/// Dialog that answers with a fixed value (or cancellation).
#[derive(Debug, Default)]
pub struct StaticDialog {
    pub answer: Option<String>,
    pub opened: usize,
}

impl PasteDialog for StaticDialog {
    fn request(&mut self, _title: Option<&str>) -> Option<String> {
        self.opened += 1;
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(content: &str) -> MemorySurface {
        MemorySurface::new(PasteConfig::default(), content)
    }

    #[test]
    fn test_extract_adjusts_later_bookmark() {
        let mut s = surface("Lorem ipsum dolor sit amet");
        let later = s.create_bookmark(DocRange::caret(26));
        s.extract_range(DocRange::new(12, 17));
        assert_eq!(s.resolve_bookmark(later), Some(DocRange::caret(21)));
    }

    #[test]
    fn test_bookmark_inside_removed_range_collapses() {
        let mut s = surface("abcdef");
        let inner = s.create_bookmark(DocRange::new(2, 4));
        s.extract_range(DocRange::new(1, 5));
        assert_eq!(s.resolve_bookmark(inner), Some(DocRange::new(1, 1)));
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut s = surface("hello world");
        s.select(DocRange::new(6, 11));
        s.insert_html("there", SemanticType::Text);
        assert_eq!(s.content(), "hello there");
        assert_eq!(s.selection(), Some(DocRange::caret(11)));
    }

    #[test]
    fn test_insert_without_selection_appends() {
        let mut s = surface("ab");
        s.insert_html("c", SemanticType::Html);
        assert_eq!(s.content(), "abc");
    }

    #[test]
    fn test_capture_buffer_roundtrip() {
        let mut s = surface("");
        s.pending_capture = Some("<div>pasted</div>".to_string());
        let buffer = s.create_capture_buffer().expect("buffer");
        s.focus_capture_buffer(buffer);
        assert_eq!(
            s.read_capture_buffer(buffer),
            Some("<div>pasted</div>".to_string())
        );
        s.destroy_capture_buffer(buffer);
        assert!(s.read_capture_buffer(buffer).is_none());
    }

    #[test]
    fn test_only_one_capture_buffer() {
        let mut s = surface("");
        let _first = s.create_capture_buffer().expect("buffer");
        assert!(s.create_capture_buffer().is_none());
    }

    #[test]
    fn test_find() {
        let s = surface("one two three");
        assert_eq!(s.find("two"), Some(DocRange::new(4, 7)));
        assert_eq!(s.find("four"), None);
    }
}
