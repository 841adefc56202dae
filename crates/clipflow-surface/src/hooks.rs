/// Named-tier hook pipeline.
///
/// Extension points run in a fixed, enumerated order instead of by priority
/// number: hooks register at a [`Tier`] and run in registration order within
/// it. Lifecycle hooks (`before_paste`, `after_paste`, drag events) sit
/// outside the tiers.
use clipflow_mod_transfer::TransferHandle;

use crate::dnd::DropContext;
use crate::record::PasteRecord;

/// The processing tiers of one paste, in execution order.
///
/// Built-in processing runs first within each tier and user hooks follow,
/// except in [`Tier::Insertion`] where user hooks run before the built-in
/// insert closes the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Default content flavor from the transfer (HTML slot, else text).
    ContentDefaults,
    /// Engine-specific artifact scrubbing.
    ArtifactScrub,
    /// Content-type sniffing and markup normalization.
    TypeSniffing,
    /// Hand-off to the engine.
    Insertion,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::ContentDefaults,
        Tier::ArtifactScrub,
        Tier::TypeSniffing,
        Tier::Insertion,
    ];

    /// Cancellation is honored up to and including the pre-classification
    /// tiers; once sniffing ran the operation is committed.
    pub fn vetoable(&self) -> bool {
        matches!(self, Tier::ContentDefaults | Tier::ArtifactScrub)
    }
}

/// A hook's decision about the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// Abort the whole operation. Intentional, silent, and only honored
    /// from vetoable positions.
    Cancel,
}

type PasteHook = Box<dyn FnMut(&mut PasteRecord) -> Verdict>;
type AfterPasteHook = Box<dyn FnMut(&PasteRecord)>;
type DragHook = Box<dyn FnMut(&TransferHandle) -> Verdict>;
type DropHook = Box<dyn FnMut(&mut DropContext, &TransferHandle) -> Verdict>;

/// Registered extension points for one orchestrator.
#[derive(Default)]
pub struct HookRegistry {
    before_paste: Vec<PasteHook>,
    paste: Vec<(Tier, PasteHook)>,
    after_paste: Vec<AfterPasteHook>,
    drag_start: Vec<DragHook>,
    drag_end: Vec<DragHook>,
    drop: Vec<DropHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs synchronously before any capture completes; the content-flavor
    /// override point. May veto the whole gesture.
    pub fn on_before_paste(&mut self, hook: impl FnMut(&mut PasteRecord) -> Verdict + 'static) {
        self.before_paste.push(Box::new(hook));
    }

    pub fn on_paste(&mut self, tier: Tier, hook: impl FnMut(&mut PasteRecord) -> Verdict + 'static) {
        self.paste.push((tier, Box::new(hook)));
    }

    /// Fires after an insertion actually happened, deferred one turn so the
    /// document is observed in its final state.
    pub fn on_after_paste(&mut self, hook: impl FnMut(&PasteRecord) + 'static) {
        self.after_paste.push(Box::new(hook));
    }

    pub fn on_drag_start(&mut self, hook: impl FnMut(&TransferHandle) -> Verdict + 'static) {
        self.drag_start.push(Box::new(hook));
    }

    pub fn on_drag_end(&mut self, hook: impl FnMut(&TransferHandle) -> Verdict + 'static) {
        self.drag_end.push(Box::new(hook));
    }

    /// May rewrite the drag/drop range pair before commit, or veto the
    /// drop.
    pub fn on_drop(&mut self, hook: impl FnMut(&mut DropContext, &TransferHandle) -> Verdict + 'static) {
        self.drop.push(Box::new(hook));
    }

    pub(crate) fn run_before_paste(&mut self, record: &mut PasteRecord) -> Verdict {
        for hook in &mut self.before_paste {
            if hook(record) == Verdict::Cancel {
                return Verdict::Cancel;
            }
        }
        Verdict::Continue
    }

    pub(crate) fn run_paste_tier(&mut self, tier: Tier, record: &mut PasteRecord) -> Verdict {
        for (hook_tier, hook) in &mut self.paste {
            if *hook_tier != tier {
                continue;
            }
            if hook(record) == Verdict::Cancel {
                if tier.vetoable() {
                    return Verdict::Cancel;
                }
                tracing::warn!(?tier, "cancellation ignored past the vetoable tiers");
            }
        }
        Verdict::Continue
    }

    pub(crate) fn run_after_paste(&mut self, record: &PasteRecord) {
        for hook in &mut self.after_paste {
            hook(record);
        }
    }

    pub(crate) fn run_drag_start(&mut self, transfer: &TransferHandle) -> Verdict {
        run_drag_hooks(&mut self.drag_start, transfer)
    }

    pub(crate) fn run_drag_end(&mut self, transfer: &TransferHandle) -> Verdict {
        run_drag_hooks(&mut self.drag_end, transfer)
    }

    pub(crate) fn run_drop(&mut self, context: &mut DropContext, transfer: &TransferHandle) -> Verdict {
        for hook in &mut self.drop {
            if hook(context, transfer) == Verdict::Cancel {
                return Verdict::Cancel;
            }
        }
        Verdict::Continue
    }
}

fn run_drag_hooks(hooks: &mut [DragHook], transfer: &TransferHandle) -> Verdict {
    for hook in hooks {
        if hook(transfer) == Verdict::Cancel {
            return Verdict::Cancel;
        }
    }
    Verdict::Continue
}
