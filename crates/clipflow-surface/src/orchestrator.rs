/// The clipboard event state machine.
///
/// Coordinates native key/menu/command triggers, the hidden capture-buffer
/// technique for engines without direct clipboard access, and the ordered
/// stage pipeline that classifies and normalizes content before the engine
/// inserts it.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use regex::Regex;

use clipflow_config::{EngineProfile, PasteConfig};
use clipflow_core::{Classification, Classifier, Dehtmlifier, Scrubber, Textifier};
use clipflow_mod_transfer::{DataKey, NativeDataSource, SessionRegistry, TransferHandle};

use crate::error::ClipboardError;
use crate::hooks::{HookRegistry, Tier, Verdict};
use crate::record::{ClipboardPayload, ContentType, Method, PasteRecord};
use crate::scheduler::{Scheduler, YieldReason};
use crate::surface::{ClipboardOp, CommandOutcome, DocRange, EditSurface, Notifier, PasteDialog, SemanticType};

/// Marker carried by breaks that stand in for line breaks encoded outside
/// the pasted value.
const EOL_BREAK: &str = "<br data-cf-eol=\"1\">";

/// Where the orchestrator currently is in a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Raw data is being captured (directly or through the buffer).
    Capturing,
    /// The stage pipeline is running over the record.
    Classifying,
    /// The engine is inserting the final value.
    Inserting,
    /// The manual-paste dialog is up.
    DialogOpen,
}

type RequestCallback = Box<dyn FnOnce(&mut Orchestrator, &mut dyn EditSurface, Option<ClipboardPayload>)>;

pub struct Orchestrator {
    pub(crate) config: PasteConfig,
    pub(crate) profile: EngineProfile,
    classifier: Classifier,
    scrubber: Scrubber,
    dehtmlifier: Dehtmlifier,
    textifier: Textifier,
    bookmark_marker: Regex,
    pub(crate) hooks: HookRegistry,
    pub(crate) scheduler: Scheduler,
    pub(crate) registry: Rc<RefCell<SessionRegistry<DocRange>>>,
    phase: Phase,
    /// Reentrancy guard: exactly one record is in flight per gesture.
    in_flight: bool,
    /// Set after handling one of a pair of native paste signals so the
    /// second does not double-process the gesture.
    suppress_native_paste: bool,
    pub(crate) capture_active: bool,
    pending_request: Option<RequestCallback>,
}

impl Orchestrator {
    pub fn new(config: PasteConfig, registry: Rc<RefCell<SessionRegistry<DocRange>>>) -> Result<Self> {
        let family = config.engine_family;
        Ok(Self {
            profile: EngineProfile::of(family),
            classifier: Classifier::new(family).context("building content classifier")?,
            scrubber: Scrubber::new(family).context("building artifact scrubber")?,
            dehtmlifier: Dehtmlifier::new(family).context("building htmlified-text folder")?,
            textifier: Textifier::new().context("building textification filter")?,
            bookmark_marker: Regex::new(r"<span[^>]+data-cf-bookmark[^<]*?</span>")
                .context("building bookmark-marker pattern")?,
            config,
            hooks: HookRegistry::new(),
            scheduler: Scheduler::new(),
            registry,
            phase: Phase::Idle,
            in_flight: false,
            suppress_native_paste: false,
            capture_active: false,
            pending_request: None,
        })
    }

    pub fn hooks(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle && self.scheduler.is_idle()
    }

    /// Drains the scheduler, resuming every parked continuation in order.
    /// The host calls this once per event-loop turn.
    pub fn run_until_idle(&mut self, surface: &mut dyn EditSurface) {
        while let Some(job) = self.scheduler.pop() {
            tracing::trace!(reason = ?job.reason, "resuming continuation");
            (job.run)(self, surface);
        }
    }

    // ── native signal entry points ───────────────────────────────────

    /// Handles a native paste signal (pre-paste or paste; some platforms
    /// deliver both for one gesture, the suppression window eats the
    /// second).
    pub fn handle_native_paste(
        &mut self,
        surface: &mut dyn EditSurface,
        native: Option<Box<dyn NativeDataSource>>,
    ) {
        if self.suppress_native_paste {
            tracing::trace!("paired paste signal suppressed");
            return;
        }
        if surface.is_read_only() {
            tracing::debug!("paste ignored on read-only surface");
            return;
        }
        self.suppress_native_paste = true;
        self.scheduler.schedule(
            YieldReason::ReactionSettle,
            Box::new(|orch, _| orch.suppress_native_paste = false),
        );

        self.phase = Phase::Capturing;
        let fresh = TransferHandle::new(native, self.profile);
        let transfer = self.registry.borrow_mut().resolve_paste(fresh);
        transfer.cache_data();

        let mut record = PasteRecord::new(transfer, Method::Paste);
        let canceled = self.hooks.run_before_paste(&mut record) == Verdict::Cancel;

        // The capture buffer is only needed when the transfer cannot be
        // trusted to expose pasted HTML.
        let html_in_transfer = self.profile.html_always_in_transfer
            || !record.transfer.get_data(&DataKey::html()).is_empty();

        if self.profile.data_available_in_paste && html_in_transfer {
            if canceled {
                self.phase = Phase::Idle;
                return;
            }
            self.scheduler.schedule(
                YieldReason::ReactionSettle,
                Box::new(move |orch, surface| {
                    orch.fire_paste(surface, record, false);
                }),
            );
        } else {
            // Even a canceled gesture must swallow the native paste, so the
            // capture still runs; it just goes nowhere.
            self.capture_via_buffer(
                surface,
                Box::new(move |orch, surface, html| {
                    if canceled {
                        orch.phase = Phase::Idle;
                        return;
                    }
                    record.value = html;
                    orch.fire_paste(surface, record, false);
                }),
            );
        }
    }

    /// Handles a native copy/cut signal on engines that expose the carrier
    /// in the event: captures the selection onto the transfer and pairs it
    /// with the upcoming paste. For cut, the selection is removed.
    pub fn handle_native_copy_cut(
        &mut self,
        surface: &mut dyn EditSurface,
        op: ClipboardOp,
        native: Option<Box<dyn NativeDataSource>>,
    ) {
        if !self.profile.data_available_in_paste {
            return;
        }
        let transfer = TransferHandle::new(native, self.profile);
        transfer.attach_source(surface.id(), &surface.selected_html(), &surface.selected_text());
        self.registry.borrow_mut().begin_copy_cut(transfer);

        if op == ClipboardOp::Cut {
            surface.save_undo_snapshot();
            if let Some(selection) = surface.selection() {
                surface.extract_range(selection);
            }
            self.scheduler.schedule(
                YieldReason::FocusSettle,
                Box::new(|_, surface| surface.save_undo_snapshot()),
            );
        }
    }

    // ── commands ─────────────────────────────────────────────────────

    /// Executes the cut command. Returns whether the platform performed it;
    /// refusals alert the user and are not retried.
    pub fn cut(&mut self, surface: &mut dyn EditSurface, notifier: &mut dyn Notifier) -> bool {
        if !self.can_cut(surface) {
            return false;
        }
        surface.save_undo_snapshot();
        match self.try_native_command(surface, ClipboardOp::Cut) {
            Ok(_) => {
                // The native mutation may land a turn late; snapshot again
                // once it settled.
                self.scheduler.schedule(
                    YieldReason::FocusSettle,
                    Box::new(|_, surface| surface.save_undo_snapshot()),
                );
                true
            }
            Err(e) => {
                tracing::warn!("{e}");
                notifier.alert(ClipboardOp::Cut);
                false
            }
        }
    }

    /// Executes the copy command; refusals alert the user.
    pub fn copy(&mut self, surface: &mut dyn EditSurface, notifier: &mut dyn Notifier) -> bool {
        if !self.can_copy(surface) {
            return false;
        }
        match self.try_native_command(surface, ClipboardOp::Copy) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{e}");
                notifier.alert(ClipboardOp::Copy);
                false
            }
        }
    }

    pub fn can_cut(&self, surface: &dyn EditSurface) -> bool {
        !surface.is_read_only() && self.can_copy(surface)
    }

    pub fn can_copy(&self, surface: &dyn EditSurface) -> bool {
        surface.selection().is_some_and(|r| !r.is_empty())
    }

    fn try_native_command(
        &mut self,
        surface: &mut dyn EditSurface,
        op: ClipboardOp,
    ) -> Result<Option<Box<dyn NativeDataSource>>, ClipboardError> {
        match surface.exec_native_command(op) {
            CommandOutcome::Performed(native) => Ok(native),
            CommandOutcome::Refused => Err(ClipboardError::UnsupportedOperation(op)),
        }
    }

    /// Executes the paste command with an explicit value (no capture).
    pub fn paste_from_value(&mut self, surface: &mut dyn EditSurface, value: String) -> bool {
        let transfer = TransferHandle::new(None, self.profile);
        let record = PasteRecord::with_value(transfer, Method::Paste, value);
        self.fire_paste(surface, record, true)
    }

    /// Executes the paste command by capturing the clipboard, falling back
    /// to the manual dialog.
    pub fn paste_command(&mut self, surface: &mut dyn EditSurface, dialog: &mut dyn PasteDialog) {
        self.request_clipboard_data(
            surface,
            dialog,
            None,
            Box::new(|orch, surface, payload| {
                if let Some(payload) = payload {
                    let transfer = TransferHandle::new(None, orch.profile);
                    let mut record =
                        PasteRecord::with_value(transfer, Method::Paste, payload.value);
                    record.content_type = payload.content_type;
                    orch.fire_paste(surface, record, true);
                }
            }),
        );
    }

    // ── capture request API ──────────────────────────────────────────

    /// Captures clipboard data without inserting it: tries the native
    /// command (whose data flows back through the normal capture path), and
    /// opens the manual dialog when the platform refuses. The callback gets
    /// the raw payload, or `None` when every capture method failed.
    pub fn request_clipboard_data(
        &mut self,
        surface: &mut dyn EditSurface,
        dialog: &mut dyn PasteDialog,
        title: Option<&str>,
        callback: RequestCallback,
    ) {
        // Fire before_paste up front so hooks can veto the capture or
        // preset the flavor, exactly as for a native gesture.
        let probe_transfer = TransferHandle::new(None, self.profile);
        let mut probe = PasteRecord::new(probe_transfer, Method::Paste);
        if self.hooks.run_before_paste(&mut probe) == Verdict::Cancel {
            callback(self, surface, None);
            return;
        }
        let preset_type = probe.content_type;

        if let CommandOutcome::Performed(native) = surface.exec_native_command(ClipboardOp::Paste) {
            self.pending_request = Some(callback);
            self.handle_native_paste(surface, native);
            // If nothing consumed the request (empty clipboard, suppressed
            // signal, vanished buffer), report the failure after the dust
            // settles.
            self.scheduler.schedule(
                YieldReason::ReactionSettle,
                Box::new(|orch, surface| {
                    if let Some(callback) = orch.pending_request.take() {
                        callback(orch, surface, None);
                    }
                }),
            );
            return;
        }

        self.phase = Phase::DialogOpen;
        let outcome = dialog.request(title);
        self.phase = Phase::Idle;
        match outcome {
            Some(value) => {
                let payload = ClipboardPayload {
                    content_type: preset_type,
                    value,
                };
                callback(self, surface, Some(payload));
            }
            None => callback(self, surface, None),
        }
    }

    // ── the paste pipeline ───────────────────────────────────────────

    /// Runs the full event chain over `record`: optional `before_paste`,
    /// the tiered stage pipeline, insertion, and the deferred completion
    /// signal. Returns whether content was inserted.
    pub fn fire_paste(
        &mut self,
        surface: &mut dyn EditSurface,
        mut record: PasteRecord,
        with_before_paste: bool,
    ) -> bool {
        if with_before_paste && self.hooks.run_before_paste(&mut record) == Verdict::Cancel {
            self.phase = Phase::Idle;
            return false;
        }

        // Nothing to paste is not an error; the gesture just evaporates.
        if record.value.is_empty() && record.transfer.is_empty() {
            tracing::debug!("empty transfer; abandoning paste");
            self.phase = Phase::Idle;
            return false;
        }

        // A pending capture request consumes the gesture before any
        // classification, exactly like a maximum-priority listener would.
        if let Some(callback) = self.pending_request.take() {
            let payload = ClipboardPayload {
                content_type: record.content_type,
                value: record.value.clone(),
            };
            callback(self, surface, Some(payload));
            self.phase = Phase::Idle;
            return false;
        }

        if self.in_flight {
            tracing::warn!("paste ignored: another record is in flight");
            return false;
        }
        self.in_flight = true;
        let inserted = self.process_record(surface, record);
        self.in_flight = false;
        if !inserted {
            self.phase = Phase::Idle;
        }
        inserted
    }

    fn process_record(&mut self, surface: &mut dyn EditSurface, mut record: PasteRecord) -> bool {
        self.phase = Phase::Classifying;
        for tier in [Tier::ContentDefaults, Tier::ArtifactScrub, Tier::TypeSniffing] {
            match tier {
                Tier::ContentDefaults => self.stage_content_defaults(&mut record),
                Tier::ArtifactScrub => self.stage_artifact_scrub(&mut record),
                Tier::TypeSniffing => self.stage_type_sniffing(&mut record),
                Tier::Insertion => {}
            }
            if self.hooks.run_paste_tier(tier, &mut record) == Verdict::Cancel {
                tracing::debug!(?tier, "paste vetoed");
                return false;
            }
        }

        self.phase = Phase::Inserting;
        self.hooks.run_paste_tier(Tier::Insertion, &mut record);
        if record.value.is_empty() {
            return false;
        }

        let semantic = match record.content_type {
            ContentType::Text => SemanticType::Text,
            _ => SemanticType::Html,
        };
        surface.insert_html(&record.value, semantic);

        // Defer the completion signal so synchronous reactions to the
        // insertion observe the final document first.
        self.scheduler.schedule(
            YieldReason::ReactionSettle,
            Box::new(move |orch, _| {
                orch.hooks.run_after_paste(&record);
            }),
        );

        self.phase = Phase::Idle;
        true
    }

    /// Default content flavor: prefer the HTML slot, fall back to the text
    /// slot rendered through the plain-text normalizer.
    fn stage_content_defaults(&mut self, record: &mut PasteRecord) {
        if !record.value.is_empty() {
            return;
        }

        let html = record.transfer.get_data(&DataKey::html());
        if !html.is_empty() {
            record.value = html;
            record.content_type = ContentType::Html;
            return;
        }

        let text = record.transfer.get_data(&DataKey::text());
        if !text.is_empty() {
            record.value = clipflow_core::textify(
                &text,
                self.config.block_mode,
                self.profile.compensates_trailing_break,
            );
            record.content_type = ContentType::Text;
        }
    }

    fn stage_artifact_scrub(&mut self, record: &mut PasteRecord) {
        let forced_html = record.content_type == ContentType::Html;
        let outcome = self.scrubber.scrub(&record.value, forced_html);
        record.value = outcome.value;
        record.flags.forced_html_before_sniff |= outcome.pre_sniffed_html;
        record.flags.prepend_break |= outcome.starts_with_break;
        record.flags.append_break |= outcome.ends_with_break;
    }

    /// Recognize what the value really is and unify its markup; resolve
    /// `Auto` against the configured default.
    fn stage_type_sniffing(&mut self, record: &mut PasteRecord) {
        let mode = self.config.block_mode;

        let true_type = if record.content_type == ContentType::Html
            || record.flags.forced_html_before_sniff
        {
            Classification::Html
        } else {
            self.classifier
                .classify(&record.value, clipflow_core::SniffFlags::default())
        };

        match true_type {
            Classification::HtmlifiedText => {
                record.value = self.dehtmlifier.normalize(&record.value, mode);
            }
            Classification::Text => {
                record.value = clipflow_core::textify(
                    &record.value,
                    mode,
                    self.profile.compensates_trailing_break,
                );
            }
            Classification::Html => {
                if record.content_type == ContentType::Text {
                    record.value = self.textifier.textify_html(&record.value, mode);
                }
            }
        }

        if record.flags.prepend_break {
            record.value = format!("{EOL_BREAK}{}", record.value);
        }
        if record.flags.append_break {
            record.value.push_str(EOL_BREAK);
        }
        record.flags.prepend_break = false;
        record.flags.append_break = false;
        record.flags.forced_html_before_sniff = false;

        if record.content_type == ContentType::Auto {
            let default_html =
                self.config.default_content_type == clipflow_config::DefaultContentType::Html;
            record.content_type = if true_type == Classification::Html || default_html {
                ContentType::Html
            } else {
                ContentType::Text
            };
        }
    }

    pub(crate) fn strip_bookmark_markers(&self, html: &str) -> String {
        self.bookmark_marker.replace_all(html, "").into_owned()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }
}
