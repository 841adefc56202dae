//! Drag-and-drop flows over the in-memory surface.

use std::cell::RefCell;
use std::rc::Rc;

use clipflow_config::{EngineFamily, EngineProfile, PasteConfig};
use clipflow_mod_transfer::SessionRegistry;
use clipflow_surface::memory::{MemoryDataSource, MemorySurface};
use clipflow_surface::{
    DocRange, DragDropCoordinator, DropEvent, EditSurface, Orchestrator, Point, Verdict,
};

type Registry = Rc<RefCell<SessionRegistry<DocRange>>>;

fn setup(family: EngineFamily) -> (PasteConfig, Registry) {
    let config = PasteConfig {
        engine_family: family,
        ..Default::default()
    };
    (config, Rc::new(RefCell::new(SessionRegistry::new(60))))
}

fn orchestrator(config: &PasteConfig, registry: &Registry) -> Orchestrator {
    Orchestrator::new(config.clone(), registry.clone()).expect("orchestrator builds")
}

fn coordinator(config: &PasteConfig, registry: &Registry) -> DragDropCoordinator {
    DragDropCoordinator::new(EngineProfile::of(config.engine_family), registry.clone())
}

fn drop_at(point: Point, carrier: &MemoryDataSource) -> DropEvent {
    DropEvent {
        point,
        native: Some(Box::new(carrier.linked())),
    }
}

#[test]
fn test_internal_drop_moves_content() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "Lorem ipsum dolor sit amet");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    let drag_range = surface.find("dolor").expect("dolor present");
    surface.select(drag_range);

    let carrier = MemoryDataSource::new();
    assert!(dnd.handle_drag_start(&mut orch, &mut surface, Some(Box::new(carrier.linked()))));

    // Drop right after "amet".
    surface.caret_point_result = Some(DocRange::caret(26));
    assert!(dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 40, y: 10 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "Lorem ipsum  sit ametdolor");
    assert_eq!(surface.undo_groups_open, 0, "undo group must be closed");
    assert!(surface.undo_snapshots >= 1);
}

#[test]
fn test_internal_drop_before_drag_range() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "Lorem ipsum dolor sit amet");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    let drag_range = surface.find("dolor").expect("dolor present");
    surface.select(drag_range);

    let carrier = MemoryDataSource::new();
    assert!(dnd.handle_drag_start(&mut orch, &mut surface, Some(Box::new(carrier.linked()))));

    // Drop at the very beginning, before the dragged text.
    surface.caret_point_result = Some(DocRange::caret(0));
    assert!(dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 0, y: 0 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "dolorLorem ipsum  sit amet");
}

#[test]
fn test_cross_surface_drop_inserts_then_removes() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut source = MemorySurface::new(config.clone(), "drag dolor here");
    let mut target = MemorySurface::new(config.clone(), "receiving: ");
    let mut source_orch = orchestrator(&config, &registry);
    let mut target_orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    let drag_range = source.find("dolor").expect("dolor present");
    source.select(drag_range);

    let carrier = MemoryDataSource::new();
    assert!(dnd.handle_drag_start(&mut source_orch, &mut source, Some(Box::new(carrier.linked()))));

    target.caret_point_result = Some(DocRange::caret(11));
    assert!(dnd.handle_drop(
        &mut target_orch,
        &mut target,
        Some(&mut source),
        drop_at(Point { x: 5, y: 5 }, &carrier),
    ));
    target_orch.run_until_idle(&mut target);

    assert_eq!(target.content(), "receiving: dolor");
    assert_eq!(source.content(), "drag  here");
    assert_eq!(source.undo_snapshots, 2, "source snapshots around its removal");
}

#[test]
fn test_external_drop_inserts_only() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "doc: ");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    let carrier = MemoryDataSource::with_text("external");
    surface.caret_point_result = Some(DocRange::caret(5));
    assert!(dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 5, y: 5 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "doc: external");
    // No correlation state may linger after an external drop.
    assert!(registry.borrow().drag_range().is_none());
}

#[test]
fn test_unresolvable_drop_position_cancels() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "unchanged");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    let carrier = MemoryDataSource::with_text("x");
    // No caret-from-point result and no cached selection: every tier of
    // the fallback chain fails.
    assert!(!dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 1, y: 1 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "unchanged");
    assert!(surface.insertions.is_empty());
}

#[test]
fn test_drop_position_falls_back_to_cached_selection() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "ab");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    surface.select(DocRange::caret(1));
    let carrier = MemoryDataSource::with_text("X");
    assert!(dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 1, y: 1 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "aXb");
}

#[test]
fn test_drop_hook_can_veto() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "keep");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);
    orch.hooks().on_drop(|_, _| Verdict::Cancel);

    let carrier = MemoryDataSource::with_text("x");
    surface.caret_point_result = Some(DocRange::caret(0));
    assert!(!dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 1, y: 1 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "keep");
}

#[test]
fn test_drop_hook_can_rewrite_position() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "ab");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);
    orch.hooks().on_drop(|context, _| {
        context.drop_range = DocRange::caret(2);
        Verdict::Continue
    });

    let carrier = MemoryDataSource::with_text("X");
    surface.caret_point_result = Some(DocRange::caret(0));
    assert!(dnd.handle_drop(
        &mut orch,
        &mut surface,
        None,
        drop_at(Point { x: 1, y: 1 }, &carrier),
    ));
    orch.run_until_idle(&mut surface);

    assert_eq!(surface.content(), "abX");
}

#[test]
fn test_drag_start_veto_prevents_correlation() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "abc def");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);
    orch.hooks().on_drag_start(|_| Verdict::Cancel);

    surface.select(DocRange::new(0, 3));
    let carrier = MemoryDataSource::new();
    assert!(!dnd.handle_drag_start(&mut orch, &mut surface, Some(Box::new(carrier))));
    assert!(registry.borrow().drag_range().is_none());
}

#[test]
fn test_drag_end_clears_correlation() {
    let (config, registry) = setup(EngineFamily::Blink);
    let mut surface = MemorySurface::new(config.clone(), "abc def");
    let mut orch = orchestrator(&config, &registry);
    let mut dnd = coordinator(&config, &registry);

    surface.select(DocRange::new(0, 3));
    let carrier = MemoryDataSource::new();
    assert!(dnd.handle_drag_start(&mut orch, &mut surface, Some(Box::new(carrier.linked()))));
    assert!(registry.borrow().drag_range().is_some());

    dnd.handle_drag_end(&mut orch, &mut surface, Some(Box::new(carrier.linked())));
    assert!(registry.borrow().drag_range().is_none());
}
