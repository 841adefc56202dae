/// Host-facing traits and position types.
use clipflow_config::PasteConfig;
use clipflow_mod_transfer::{NativeDataSource, SurfaceId};

/// A contiguous range of character offsets into the surface's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocRange {
    pub start: usize,
    pub end: usize,
}

impl DocRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A collapsed range (a caret).
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pointer coordinates in the surface's viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Semantic type declared to the engine on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Html,
    Text,
}

/// The three native clipboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Cut,
    Copy,
    Paste,
}

impl std::fmt::Display for ClipboardOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cut => write!(f, "cut"),
            Self::Copy => write!(f, "copy"),
            Self::Paste => write!(f, "paste"),
        }
    }
}

/// Stable position anchor issued by the surface. Survives document mutation
/// until resolved; resolving consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bookmark(pub u64);

/// Handle to the surface's hidden capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureBufferId(pub u64);

/// Element hit by a pointer, for the drop-position box heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitElement {
    /// The hit landed on the surface root rather than a real element.
    pub is_root: bool,
    /// Left edge of the element's bounding box.
    pub rect_left: i32,
    /// Caret just inside the element's start.
    pub at_start: DocRange,
    /// Caret just inside the element's end.
    pub at_end: DocRange,
}

/// What a native clipboard command attempt produced.
pub enum CommandOutcome {
    /// The platform refused the command (security policy, engine
    /// restriction).
    Refused,
    /// The command ran; an in-event data carrier is included when the
    /// platform delivered one.
    Performed(Option<Box<dyn NativeDataSource>>),
}

/// The host rich-text engine, reduced to what clipboard handling needs.
///
/// Ranges are character offsets; how the engine maps them to its document
/// model is its business. Content copied out through [`selected_html`] must
/// wrap nested editable roots with the `data-clipflow-surface` attribute so
/// pastes can unwrap them.
///
/// [`selected_html`]: EditSurface::selected_html
pub trait EditSurface {
    fn id(&self) -> SurfaceId;

    /// Read-only configuration view.
    fn config(&self) -> &PasteConfig;

    fn is_read_only(&self) -> bool {
        false
    }

    fn selection(&self) -> Option<DocRange>;

    fn select(&mut self, range: DocRange);

    /// The current selection serialized as HTML.
    fn selected_html(&self) -> String;

    /// The current selection reduced to plain text.
    fn selected_text(&self) -> String;

    /// Anchors a range so it survives document mutation.
    fn create_bookmark(&mut self, range: DocRange) -> Bookmark;

    /// Resolves (and consumes) a bookmark. `None` when the anchored content
    /// no longer exists.
    fn resolve_bookmark(&mut self, bookmark: Bookmark) -> Option<DocRange>;

    /// Removes a range from the document, returning its HTML.
    fn extract_range(&mut self, range: DocRange) -> String;

    /// Inserts HTML at the current selection, replacing it. `semantic`
    /// declares whether surrounding formatting should treat the content as
    /// rich markup or as text pasted into the local style context.
    fn insert_html(&mut self, html: &str, semantic: SemanticType);

    /// Marks an undo-snapshot boundary.
    fn save_undo_snapshot(&mut self);

    /// Opens a compound edit recorded as one undo step.
    fn begin_undo_group(&mut self) {}

    fn end_undo_group(&mut self) {}

    /// Attempts a native clipboard command. Implementations must complete
    /// the command (including delivering any data carrier) before
    /// returning.
    fn exec_native_command(&mut self, _op: ClipboardOp) -> CommandOutcome {
        CommandOutcome::Refused
    }

    // Capture-buffer support. Surfaces that can always hand clipboard data
    // over directly may leave these unimplemented.

    /// Creates the hidden buffer a redirected native paste will write into.
    /// `None` when the surface cannot host one (fatal to that one attempt).
    fn create_capture_buffer(&mut self) -> Option<CaptureBufferId> {
        None
    }

    fn focus_capture_buffer(&mut self, _buffer: CaptureBufferId) {}

    /// Reads the buffer's content after the native write completed. `None`
    /// when the buffer vanished mid-capture.
    fn read_capture_buffer(&mut self, _buffer: CaptureBufferId) -> Option<String> {
        None
    }

    fn destroy_capture_buffer(&mut self, _buffer: CaptureBufferId) {}

    // Drop-position support.

    /// Direct position-from-point lookup.
    fn caret_from_point(&self, _point: Point) -> Option<DocRange> {
        None
    }

    /// Temporary marker-insertion probe at a point.
    fn probe_marker_at(&mut self, _point: Point) -> Option<DocRange> {
        None
    }

    /// Element-level hit test for the bounding-box heuristic.
    fn element_at(&self, _point: Point) -> Option<HitElement> {
        None
    }

    /// Rejoins a text node the platform split at the drop point, returning
    /// the corrected drop range. Surfaces on engines without that defect
    /// keep the default identity implementation.
    fn heal_drop_split(&mut self, _drag: DocRange, drop: DocRange) -> DocRange {
        drop
    }
}

/// User-visible alerts. Only genuinely unsupported platform operations are
/// ever surfaced here.
pub trait Notifier {
    fn alert(&mut self, op: ClipboardOp);
}

/// The manual-paste dialog shown when programmatic capture fails.
pub trait PasteDialog {
    /// Blocks on the user; `Some` carries the committed content, `None`
    /// means the dialog was cancelled.
    fn request(&mut self, title: Option<&str>) -> Option<String>;
}
