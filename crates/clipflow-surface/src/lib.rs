//! Event orchestration for clipboard and drag-and-drop on an edit surface.
//!
//! The host owns an [`EditSurface`] implementation and delivers native
//! signals (key, menu, drag events) to the [`Orchestrator`] and
//! [`DragDropCoordinator`]. Everything here is single-threaded and
//! cooperative: work that must wait for the platform is parked on the
//! [`Scheduler`] with an explicit reason code, and the host drains it with
//! [`Orchestrator::run_until_idle`].

pub mod dnd;
pub mod error;
pub mod hooks;
pub mod memory;
pub mod orchestrator;
mod pastebin;
pub mod record;
pub mod scheduler;
pub mod surface;

pub use dnd::{DragDropCoordinator, DropContext, DropEvent};
pub use error::ClipboardError;
pub use hooks::{HookRegistry, Tier, Verdict};
pub use orchestrator::{Orchestrator, Phase};
pub use record::{ClipboardPayload, ContentType, Method, PasteRecord, RecordFlags};
pub use scheduler::{Scheduler, YieldReason};
pub use surface::{
    Bookmark, CaptureBufferId, ClipboardOp, CommandOutcome, DocRange, EditSurface, HitElement,
    Notifier, PasteDialog, Point, SemanticType,
};
