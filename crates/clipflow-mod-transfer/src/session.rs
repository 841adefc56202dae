/// Process-scoped correlation state for in-flight gestures.
use chrono::{DateTime, Duration, Utc};

use crate::transfer::TransferHandle;

struct DragGesture<R> {
    transfer: TransferHandle,
    range: Option<R>,
    started: DateTime<Utc>,
}

/// Registry binding the paired events of one gesture across surfaces.
///
/// A drop must be able to recognize a drag that started on another surface
/// instance, and a paste must find the transfer captured on copy/cut. The
/// registry is owned by the host and passed by reference to every
/// coordinator, so the correlation state is explicit rather than hidden
/// module state. `R` is the host's document-range type for the saved drag
/// range.
pub struct SessionRegistry<R> {
    drag: Option<DragGesture<R>>,
    copy_cut: Option<TransferHandle>,
    stale_after: Duration,
}

impl<R: Clone> SessionRegistry<R> {
    pub fn new(stale_drag_secs: u64) -> Self {
        Self {
            drag: None,
            copy_cut: None,
            stale_after: Duration::seconds(stale_drag_secs.min(i64::MAX as u64) as i64),
        }
    }

    /// Records a started drag with the range it covers.
    pub fn begin_drag(&mut self, transfer: TransferHandle, range: Option<R>) {
        self.drag = Some(DragGesture {
            transfer,
            range,
            started: Utc::now(),
        });
    }

    /// Resolves the transfer for a drop event: when `fresh` carries the
    /// token of the recorded drag, the drag's transfer (with its captured
    /// content and source surface) wins; otherwise the drop came from
    /// elsewhere and `fresh` is recorded in its place.
    pub fn resolve_drag(&mut self, fresh: TransferHandle) -> TransferHandle {
        self.evict_stale_drag();

        match &self.drag {
            Some(gesture) if gesture.transfer.token() == fresh.token() => {
                gesture.transfer.clone()
            }
            _ => {
                self.drag = Some(DragGesture {
                    transfer: fresh.clone(),
                    range: None,
                    started: Utc::now(),
                });
                fresh
            }
        }
    }

    /// The range the recorded drag started from, if any.
    pub fn drag_range(&self) -> Option<R> {
        self.drag.as_ref().and_then(|g| g.range.clone())
    }

    /// Forgets the drag so a future external drop is not misread as
    /// internal.
    pub fn reset_drag(&mut self) {
        self.drag = None;
    }

    /// Records the transfer captured on copy/cut.
    pub fn begin_copy_cut(&mut self, transfer: TransferHandle) {
        self.copy_cut = Some(transfer);
    }

    /// Resolves the transfer for a paste event, preferring the copy/cut
    /// gesture's transfer when the tokens pair up.
    pub fn resolve_paste(&mut self, fresh: TransferHandle) -> TransferHandle {
        match &self.copy_cut {
            Some(stored) if stored.token() == fresh.token() => stored.clone(),
            _ => {
                self.copy_cut = Some(fresh.clone());
                fresh
            }
        }
    }

    fn evict_stale_drag(&mut self) {
        if let Some(gesture) = &self.drag {
            if Utc::now() - gesture.started > self.stale_after {
                tracing::debug!("evicting stale drag gesture");
                self.drag = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_config::{EngineFamily, EngineProfile};

    type Registry = SessionRegistry<(usize, usize)>;

    fn handle() -> TransferHandle {
        TransferHandle::new(None, EngineProfile::of(EngineFamily::Blink))
    }

    #[test]
    fn test_matching_drop_reuses_drag_transfer() {
        let mut registry = Registry::new(60);
        let drag = handle();
        drag.set_data(&crate::DataKey::html(), "<b>x</b>");
        registry.begin_drag(drag.clone(), Some((3, 7)));

        // A drop handle created from the same gesture carries the same
        // token; simulate by cloning (shared inner keeps the token).
        let resolved = registry.resolve_drag(drag.clone());
        assert_eq!(resolved.get_data(&crate::DataKey::html()), "<b>x</b>");
        assert_eq!(registry.drag_range(), Some((3, 7)));
    }

    #[test]
    fn test_foreign_drop_replaces_drag() {
        let mut registry = Registry::new(60);
        registry.begin_drag(handle(), Some((0, 1)));

        let foreign = handle();
        let resolved = registry.resolve_drag(foreign.clone());
        assert_eq!(resolved.token(), foreign.token());
        assert_eq!(registry.drag_range(), None);
    }

    #[test]
    fn test_reset_drag() {
        let mut registry = Registry::new(60);
        registry.begin_drag(handle(), Some((0, 1)));
        registry.reset_drag();
        assert_eq!(registry.drag_range(), None);
    }

    #[test]
    fn test_paste_pairs_with_copy() {
        let mut registry = Registry::new(60);
        let copied = handle();
        copied.set_data(&crate::DataKey::html(), "<i>y</i>");
        registry.begin_copy_cut(copied.clone());

        let resolved = registry.resolve_paste(copied.clone());
        assert_eq!(resolved.get_data(&crate::DataKey::html()), "<i>y</i>");
    }

    #[test]
    fn test_unrelated_paste_stored() {
        let mut registry = Registry::new(60);
        registry.begin_copy_cut(handle());

        let fresh = handle();
        let resolved = registry.resolve_paste(fresh.clone());
        assert_eq!(resolved.token(), fresh.token());
    }
}
