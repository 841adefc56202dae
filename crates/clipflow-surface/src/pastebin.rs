/// The hidden capture-buffer technique.
///
/// When the platform offers no programmatic read of the clipboard, the
/// native paste is redirected into an off-screen editable buffer: selection
/// is parked as a bookmark, focus moves to the buffer, the native write is
/// given one turn to land, then the buffer is read back, the selection
/// restored and the buffer destroyed. The buffer exists only for the one
/// capture.
use crate::orchestrator::{Orchestrator, Phase};
use crate::scheduler::YieldReason;
use crate::surface::EditSurface;

type CaptureCallback = Box<dyn FnOnce(&mut Orchestrator, &mut dyn EditSurface, String)>;

impl Orchestrator {
    /// Redirects the in-progress native paste into a hidden buffer and
    /// resumes with its content. A second capture while one is active is
    /// ignored, not queued; a buffer that cannot be created or vanishes
    /// mid-capture aborts this one attempt silently.
    pub(crate) fn capture_via_buffer(
        &mut self,
        surface: &mut dyn EditSurface,
        on_content: CaptureCallback,
    ) {
        if self.capture_active {
            tracing::debug!("capture already active; ignoring");
            return;
        }

        let bookmark = match surface.selection() {
            Some(range) => Some(surface.create_bookmark(range)),
            None => None,
        };

        let Some(buffer) = surface.create_capture_buffer() else {
            tracing::debug!("no capture buffer available; abandoning this paste");
            if let Some(bookmark) = bookmark {
                if let Some(range) = surface.resolve_bookmark(bookmark) {
                    surface.select(range);
                }
            }
            self.set_phase(Phase::Idle);
            return;
        };

        self.capture_active = true;
        surface.focus_capture_buffer(buffer);

        self.scheduler.schedule(
            YieldReason::NativeWrite,
            Box::new(move |orch, surface| {
                let content = surface.read_capture_buffer(buffer);

                if let Some(bookmark) = bookmark {
                    if let Some(range) = surface.resolve_bookmark(bookmark) {
                        surface.select(range);
                    }
                }
                surface.destroy_capture_buffer(buffer);
                orch.capture_active = false;

                match content {
                    Some(html) => {
                        // Bookmark markers may have been serialized into the
                        // buffer along with the content.
                        let cleaned = orch.strip_bookmark_markers(&html);
                        on_content(orch, surface, cleaned);
                    }
                    None => {
                        tracing::debug!("capture buffer vanished; abandoning this paste");
                        orch.set_phase(Phase::Idle);
                    }
                }
            }),
        );
    }
}
