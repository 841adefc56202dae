/// Drag-and-drop coordination.
use std::cell::RefCell;
use std::rc::Rc;

use clipflow_config::{DropStrategy, EngineProfile};
use clipflow_mod_transfer::{NativeDataSource, SessionRegistry, TransferHandle, TransferType};

use crate::hooks::Verdict;
use crate::orchestrator::Orchestrator;
use crate::record::{Method, PasteRecord};
use crate::surface::{DocRange, EditSurface, Point};

/// The range pair a drop commits: where the drag came from (when known) and
/// where the content lands. Drop hooks may rewrite either before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropContext {
    pub drag_range: Option<DocRange>,
    pub drop_range: DocRange,
}

/// A native drop signal.
pub struct DropEvent {
    pub point: Point,
    pub native: Option<Box<dyn NativeDataSource>>,
}

/// Sequences drag gestures: classifies each drop as same-surface,
/// cross-surface or external, resolves the drop caret, and orders content
/// removal against insertion so neither invalidates the other.
pub struct DragDropCoordinator {
    profile: EngineProfile,
    registry: Rc<RefCell<SessionRegistry<DocRange>>>,
}

impl DragDropCoordinator {
    pub fn new(profile: EngineProfile, registry: Rc<RefCell<SessionRegistry<DocRange>>>) -> Self {
        Self { profile, registry }
    }

    /// Handles a drag leaving the surface: captures the selection onto the
    /// transfer and records the gesture for drop correlation.
    pub fn handle_drag_start(
        &mut self,
        orch: &mut Orchestrator,
        surface: &mut dyn EditSurface,
        native: Option<Box<dyn NativeDataSource>>,
    ) -> bool {
        let transfer = TransferHandle::new(native, self.profile);
        transfer.attach_source(surface.id(), &surface.selected_html(), &surface.selected_text());

        if orch.hooks.run_drag_start(&transfer) == Verdict::Cancel {
            return false;
        }

        self.registry
            .borrow_mut()
            .begin_drag(transfer, surface.selection());
        true
    }

    /// Handles the end of a drag gesture; unless a hook vetoes, the
    /// recorded gesture is forgotten so a later external drop is not
    /// misread as internal.
    pub fn handle_drag_end(
        &mut self,
        orch: &mut Orchestrator,
        _surface: &mut dyn EditSurface,
        native: Option<Box<dyn NativeDataSource>>,
    ) {
        let fresh = TransferHandle::new(native, self.profile);
        let transfer = self.registry.borrow_mut().resolve_drag(fresh);

        if orch.hooks.run_drag_end(&transfer) == Verdict::Cancel {
            return;
        }
        self.registry.borrow_mut().reset_drag();
    }

    /// Handles a drop on `target`. For a cross-surface drop the host passes
    /// the source surface as well (it can identify it through
    /// [`SessionRegistry`] and the transfer's source id). Returns whether
    /// the drop was committed.
    pub fn handle_drop(
        &mut self,
        orch: &mut Orchestrator,
        target: &mut dyn EditSurface,
        source: Option<&mut dyn EditSurface>,
        event: DropEvent,
    ) -> bool {
        let fresh = TransferHandle::new(event.native, self.profile);
        let transfer = self.registry.borrow_mut().resolve_drag(fresh);
        transfer.cache_data();

        let Some(drop_range) = resolve_drop_position(&self.profile, target, event.point) else {
            tracing::debug!("no drop position could be resolved; canceling drop");
            return false;
        };

        let mut context = DropContext {
            drag_range: self.registry.borrow().drag_range(),
            drop_range,
        };
        if orch.hooks.run_drop(&mut context, &transfer) == Verdict::Cancel {
            return false;
        }

        match transfer.transfer_type(target.id()) {
            TransferType::Internal => self.internal_drop(orch, target, context, transfer),
            TransferType::CrossSurface => match source {
                Some(source) => self.cross_surface_drop(orch, target, source, context, transfer),
                None => {
                    tracing::warn!("source surface unavailable for cross-surface drop");
                    self.external_drop(orch, target, context, transfer);
                }
            },
            TransferType::External => self.external_drop(orch, target, context, transfer),
        }
        true
    }

    /// Same-surface drop: removal and insertion form one undo step.
    fn internal_drop(
        &mut self,
        orch: &mut Orchestrator,
        surface: &mut dyn EditSurface,
        context: DropContext,
        transfer: TransferHandle,
    ) {
        let Some(drag_range) = context.drag_range else {
            tracing::warn!("internal drop without a drag range; inserting only");
            self.external_drop(orch, surface, context, transfer);
            return;
        };

        surface.save_undo_snapshot();
        surface.begin_undo_group();

        let mut drop_range = context.drop_range;
        if self.profile.splits_text_node_on_drop {
            drop_range = surface.heal_drop_split(drag_range, drop_range);
        }

        // Bookmark whichever range sits later in the document first, so
        // anchoring it cannot invalidate the earlier range's offsets.
        let (drag_bookmark, drop_bookmark) = if is_range_before(drag_range, drop_range) {
            let drop_bookmark = surface.create_bookmark(drop_range);
            (surface.create_bookmark(drag_range), drop_bookmark)
        } else {
            let drag_bookmark = surface.create_bookmark(drag_range);
            (drag_bookmark, surface.create_bookmark(drop_range))
        };

        if let Some(range) = surface.resolve_bookmark(drag_bookmark) {
            surface.extract_range(range);
        }
        if let Some(range) = surface.resolve_bookmark(drop_bookmark) {
            surface.select(range);
        }

        orch.fire_paste(surface, PasteRecord::new(transfer, Method::Drop), true);

        surface.end_undo_group();
    }

    /// Drop between two surfaces of the same family: insert into the
    /// destination first, then remove from the source (the reverse order
    /// corrupts the drop range on some platforms).
    fn cross_surface_drop(
        &mut self,
        orch: &mut Orchestrator,
        target: &mut dyn EditSurface,
        source: &mut dyn EditSurface,
        context: DropContext,
        transfer: TransferHandle,
    ) {
        target.select(context.drop_range);
        orch.fire_paste(target, PasteRecord::new(transfer, Method::Drop), true);

        if let Some(drag_range) = context.drag_range {
            source.save_undo_snapshot();
            source.extract_range(drag_range);
            source.save_undo_snapshot();
        }
    }

    /// Drop from outside any known surface: insert only, then clear the
    /// lingering correlation state (no drag-end will arrive to do it).
    fn external_drop(
        &mut self,
        orch: &mut Orchestrator,
        target: &mut dyn EditSurface,
        context: DropContext,
        transfer: TransferHandle,
    ) {
        target.select(context.drop_range);
        orch.fire_paste(target, PasteRecord::new(transfer, Method::Drop), true);
        self.registry.borrow_mut().reset_drag();
    }
}

/// True when `first` ends before `second` begins. Anchoring the later range
/// first keeps the earlier range's offsets valid.
fn is_range_before(first: DocRange, second: DocRange) -> bool {
    first.end <= second.start
}

/// Walks the profile's fallback chain until a tier yields a caret.
fn resolve_drop_position(
    profile: &EngineProfile,
    surface: &mut dyn EditSurface,
    point: Point,
) -> Option<DocRange> {
    for strategy in profile.drop_strategies {
        let resolved = match strategy {
            DropStrategy::CaretFromPoint => surface.caret_from_point(point),
            DropStrategy::MarkerProbe => probe_with_retries(surface, point),
            DropStrategy::ElementBox => element_box_heuristic(surface, point),
            DropStrategy::CachedSelection => surface.selection(),
        };
        if let Some(range) = resolved {
            tracing::trace!(?strategy, "drop position resolved");
            return Some(range);
        }
    }
    None
}

/// The marker probe fails between text lines; retry up to 20 device pixels
/// above and below the pointer to find the nearest valid position.
fn probe_with_retries(surface: &mut dyn EditSurface, point: Point) -> Option<DocRange> {
    for offset in 0..20 {
        for y in [point.y - offset, point.y + offset] {
            if let Some(range) = surface.probe_marker_at(Point { x: point.x, y }) {
                return Some(range);
            }
        }
    }
    None
}

/// Short elements (headers next to empty space) defeat the probe; compare
/// the pointer against the hit element's box instead.
fn element_box_heuristic(surface: &mut dyn EditSurface, point: Point) -> Option<DocRange> {
    let hit = surface.element_at(point)?;
    if hit.is_root {
        return None;
    }
    Some(if point.x < hit.rect_left {
        hit.at_start
    } else {
        hit.at_end
    })
}
