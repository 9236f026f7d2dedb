//! Content session: one engine attached to one frame.
//!
//! The session owns the engine state behind a single mutex and routes page
//! events to the hover detector and the overlay controller. Async work
//! (relay round trips, the can-play wait, timers) runs as tasks of the
//! session's [`TaskScope`]; none of it holds the engine lock across an
//! `.await`, and every continuation re-checks that its overlay is still the
//! live one before touching the page.

use std::sync::{Arc, Weak};
use std::time::Duration;

use hoverplay_config::Preferences;
use hoverplay_protocols::{
    ChangeSet, EventDisposition, ExtensionRuntime, KeyEvent, ListenerKind, NodeId, Page,
    PageEvent, PointerEvent, PreferenceStore,
};
use hoverplay_relay::RelayClient;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::hover::{HoverAction, HoverIntentDetector, HoverStep};
use crate::lifecycle::{
    AttachRegistry, DestructTarget, FrameKey, Lifecycle, SessionState, TeardownHook,
};
use crate::link::LinkInfo;
use crate::listeners::ListenerSet;
use crate::overlay::{
    CAN_PLAY_TIMEOUT, FADE_IN_DELAY, LOADED_DELAY, Overlay, OverlayController, OverlayId,
    OverlayPhase, SourcePlan, SurfaceKind, strike_links,
};
use crate::preferences::{PreferenceBinding, SharedPreferences};
use crate::timer::{TaskScope, TimerSlot};

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

/// The collaborators a session is attached with.
pub struct SessionParts {
    pub page: Arc<dyn Page>,
    pub relay: RelayClient,
    pub store: Arc<dyn PreferenceStore>,
    pub runtime: Arc<dyn ExtensionRuntime>,
}

struct EngineState {
    detector: HoverIntentDetector,
    overlay: OverlayController,
    listeners: ListenerSet,
    hover_timer: TimerSlot,
}

struct SessionShared {
    page: Arc<dyn Page>,
    relay: RelayClient,
    runtime: Arc<dyn ExtensionRuntime>,
    binding: PreferenceBinding,
    engine: Mutex<EngineState>,
    lifecycle: Lifecycle,
    registry: Arc<AttachRegistry>,
    frame: FrameKey,
    scope: TaskScope,
}

/// Handle to an attached engine. Cheap to clone.
#[derive(Clone)]
pub struct ContentSession {
    shared: Arc<SessionShared>,
}

impl ContentSession {
    /// Attach to the frame behind `parts.page`, using the process-wide
    /// attach registry.
    pub async fn attach(parts: SessionParts) -> Result<Self, SessionError> {
        Self::attach_with_registry(parts, AttachRegistry::global()).await
    }

    /// Attach with an explicit registry.
    ///
    /// A session already on the frame is sent the destruct signal first; it
    /// lets go of the frame only if its extension context is gone. Fails
    /// with [`SessionError::AlreadyAttached`] when it stays, and with
    /// [`SessionError::Store`] when preferences cannot be loaded. Must be
    /// called inside a tokio runtime.
    pub async fn attach_with_registry(
        parts: SessionParts,
        registry: Arc<AttachRegistry>,
    ) -> Result<Self, SessionError> {
        let SessionParts {
            page,
            relay,
            store,
            runtime,
        } = parts;

        let frame = FrameKey::of(&page);
        if !registry.claim(frame) {
            registry.signal(frame);
            if !registry.claim(frame) {
                warn!("Refusing second attach to {}", frame);
                return Err(SessionError::AlreadyAttached(frame));
            }
        }
        let (binding, changes) = match PreferenceBinding::attach(store).await {
            Ok(attached) => attached,
            Err(e) => {
                registry.release(frame);
                return Err(e.into());
            }
        };

        let detector = HoverIntentDetector::new(page.as_ref());
        let shared = Arc::new(SessionShared {
            page,
            relay,
            runtime,
            binding,
            engine: Mutex::new(EngineState {
                detector,
                overlay: OverlayController::new(),
                listeners: ListenerSet::new(),
                hover_timer: TimerSlot::new(),
            }),
            lifecycle: Lifecycle::new(),
            registry,
            frame,
            scope: TaskScope::current(),
        });

        {
            let page = shared.page.as_ref();
            let mut guard = shared.engine.lock();
            let engine = &mut *guard;
            engine.listeners.enable(page, ListenerKind::DestructSignal);
            let prefs = shared.binding.prefs().read();
            engine.detector.rebind(page, &prefs, &mut engine.listeners);
        }
        spawn_preference_pump(&shared, changes);
        shared.lifecycle.mark_attached();
        let target: Weak<dyn DestructTarget> = Arc::downgrade(&shared) as Weak<SessionShared>;
        shared.registry.bind(frame, target);
        info!("Session attached to {} at {}", frame, shared.page.location());

        Ok(Self { shared })
    }

    /// Route one page event. Never fails; the disposition tells the host
    /// what to do with the event.
    pub fn dispatch(&self, event: PageEvent) -> EventDisposition {
        if !self.shared.lifecycle.is_attached() {
            return EventDisposition::pass();
        }
        match event {
            PageEvent::DestructSignal => self.shared.on_destruct_signal(),
            event => self.shared.handle(event),
        }
    }

    /// Tear the session down. Returns `false` if it already was.
    pub fn detach(&self) -> bool {
        self.shared.teardown()
    }

    /// Dismiss the current overlay, if any.
    pub fn remove_overlay(&self) -> bool {
        let page = self.shared.page.as_ref();
        let mut guard = self.shared.engine.lock();
        let engine = &mut *guard;
        engine.overlay.remove(page, &mut engine.listeners)
    }

    /// Run `hook` when the session tears down.
    pub fn on_teardown(&self, hook: Arc<dyn TeardownHook>) {
        self.shared.lifecycle.register_hook(hook);
    }

    pub fn state(&self) -> SessionState {
        self.shared.lifecycle.state()
    }

    pub fn frame(&self) -> FrameKey {
        self.shared.frame
    }

    pub fn prefs(&self) -> SharedPreferences {
        self.shared.binding.prefs().clone()
    }

    pub fn overlay_phase(&self) -> OverlayPhase {
        self.shared.engine.lock().overlay.phase()
    }

    pub fn overlay_root(&self) -> Option<NodeId> {
        self.shared.engine.lock().overlay.root()
    }

    /// The media surface of the current overlay.
    pub fn overlay_surface(&self) -> Option<(NodeId, SurfaceKind)> {
        self.shared
            .engine
            .lock()
            .overlay
            .current()
            .map(|overlay| (overlay.surface(), overlay.surface_kind()))
    }

    /// Whether a hover intent waits for its delay timer.
    pub fn is_hover_pending(&self) -> bool {
        self.shared.engine.lock().detector.is_pending()
    }
}

/// Apply preference notifications in arrival order.
fn spawn_preference_pump(shared: &Arc<SessionShared>, mut changes: broadcast::Receiver<ChangeSet>) {
    let session = Arc::downgrade(shared);
    shared.scope.spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change_set) => {
                    let Some(shared) = session.upgrade() else {
                        break;
                    };
                    shared.apply_preferences(&change_set);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {} preference notifications", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Preference pump stopped");
    });
}

impl SessionShared {
    fn is_live(&self) -> bool {
        matches!(
            self.lifecycle.state(),
            SessionState::Attaching | SessionState::Attached
        )
    }

    fn apply_preferences(&self, changes: &ChangeSet) {
        let outcome = self.binding.apply(changes);
        if outcome.applied.is_empty() || !self.is_live() {
            return;
        }
        let page = self.page.as_ref();
        let mut guard = self.engine.lock();
        let engine = &mut *guard;
        let prefs = self.binding.prefs().read();
        if engine.detector.rebind(page, &prefs, &mut engine.listeners) {
            engine.hover_timer.cancel();
        }
    }

    fn handle(self: &Arc<Self>, event: PageEvent) -> EventDisposition {
        let page = self.page.as_ref();
        let mut guard = self.engine.lock();
        let engine = &mut *guard;
        let prefs = self.binding.prefs().read();

        match event {
            PageEvent::PointerOver(ev) => {
                if engine.overlay.is_dragging() {
                    return EventDisposition::consumed();
                }
                if !engine.listeners.is_enabled(ListenerKind::PointerOver) {
                    return EventDisposition::pass();
                }
                let exists = engine.overlay.exists();
                let step =
                    engine
                        .detector
                        .on_pointer_over(page, &prefs, &mut engine.listeners, &ev, exists);
                self.apply_step(engine, &prefs, step)
            }
            PageEvent::PointerEnter(_) | PageEvent::PointerLeave(_) => {
                if engine.overlay.is_dragging() {
                    EventDisposition::consumed()
                } else {
                    EventDisposition::pass()
                }
            }
            PageEvent::PointerMove(ev) => self.on_pointer_move(engine, &prefs, &ev),
            PageEvent::PointerDown(ev) => self.on_pointer_down(engine, &ev),
            PageEvent::PointerUp(ev) => {
                if let Some(overlay) = engine.overlay.current_mut() {
                    if overlay.is_dragging() {
                        overlay.end_drag(
                            page,
                            &mut engine.listeners,
                            Some(ev.client_point()),
                            prefs.native,
                        );
                        return EventDisposition::consumed();
                    }
                }
                EventDisposition::pass()
            }
            PageEvent::Click(ev) => self.on_click(engine, &ev),
            PageEvent::KeyDown(ev) => self.on_key(engine, &prefs, &ev),
            PageEvent::SelectionChange => {
                if engine.overlay.is_dragging() {
                    page.clear_selection();
                }
                EventDisposition::pass()
            }
            PageEvent::Mutation => {
                engine.detector.on_mutation(page, &mut engine.listeners);
                EventDisposition::pass()
            }
            PageEvent::MediaLoaded { node } => {
                self.on_media_loaded(engine, node);
                EventDisposition::pass()
            }
            PageEvent::MediaCanPlay { node } => {
                if let Some(overlay) = engine.overlay.current_mut() {
                    overlay.signal_can_play(node, true);
                }
                EventDisposition::pass()
            }
            PageEvent::MediaError { node } => {
                if let Some(overlay) = engine.overlay.current_mut() {
                    overlay.signal_can_play(node, false);
                }
                EventDisposition::pass()
            }
            PageEvent::VolumeChange { node, volume } => {
                let native_surface = engine.overlay.current().is_some_and(|overlay| {
                    overlay.surface() == node && overlay.surface_kind() == SurfaceKind::Video
                });
                if native_surface {
                    self.persist_volume(volume);
                }
                EventDisposition::pass()
            }
            PageEvent::DestructSignal => EventDisposition::pass(),
        }
    }

    fn on_pointer_move(
        self: &Arc<Self>,
        engine: &mut EngineState,
        prefs: &Preferences,
        event: &PointerEvent,
    ) -> EventDisposition {
        let page = self.page.as_ref();
        if let Some(overlay) = engine.overlay.current_mut() {
            if overlay.is_dragging() {
                overlay.drag_to(page, event.client_point());
                return EventDisposition::consumed();
            }
        }
        if !engine.listeners.is_enabled(ListenerKind::PointerMove) {
            return EventDisposition::pass();
        }
        let step = engine
            .detector
            .on_pointer_move(page, &mut engine.listeners, event);
        self.apply_step(engine, prefs, step)
    }

    fn on_pointer_down(&self, engine: &mut EngineState, event: &PointerEvent) -> EventDisposition {
        let page = self.page.as_ref();
        if let Some(overlay) = engine.overlay.current_mut() {
            if let Some(disposition) = overlay.begin_drag(page, &mut engine.listeners, event) {
                return disposition;
            }
        }
        if engine.listeners.is_enabled(ListenerKind::PointerDown) {
            let outcome = engine
                .detector
                .on_click(page, &mut engine.listeners, event, None);
            if outcome.cancel_timer {
                engine.hover_timer.cancel();
            }
        }
        EventDisposition::pass()
    }

    fn on_click(&self, engine: &mut EngineState, event: &PointerEvent) -> EventDisposition {
        let page = self.page.as_ref();
        if engine.listeners.is_enabled(ListenerKind::ClickConsumer) {
            if let Some(overlay) = engine.overlay.current_mut() {
                return overlay.consume_click(page, &mut engine.listeners);
            }
            engine.listeners.disable(page, ListenerKind::ClickConsumer);
        }
        if engine.listeners.is_enabled(ListenerKind::DismissClick) {
            let root = engine.overlay.root();
            let outcome = engine
                .detector
                .on_click(page, &mut engine.listeners, event, root);
            if outcome.cancel_timer {
                engine.hover_timer.cancel();
            }
            if outcome.dismiss {
                debug!("Click outside the overlay");
                engine.overlay.remove(page, &mut engine.listeners);
            }
        }
        EventDisposition::pass()
    }

    fn on_key(
        self: &Arc<Self>,
        engine: &mut EngineState,
        prefs: &Preferences,
        event: &KeyEvent,
    ) -> EventDisposition {
        let page = self.page.as_ref();
        let mut disposition = EventDisposition::pass();
        if engine.listeners.is_enabled(ListenerKind::HotkeyDown) {
            let exists = engine.overlay.exists();
            let step = engine
                .detector
                .on_key(page, prefs, &mut engine.listeners, event, exists);
            disposition = self.apply_step(engine, prefs, step);
        }
        if engine.listeners.is_enabled(ListenerKind::DismissKey) && event.code == "Escape" {
            disposition.prevent_default = true;
            let dragging = engine.overlay.current_mut().filter(|o| o.is_dragging());
            match dragging {
                Some(overlay) => overlay.stop_drag(page, &mut engine.listeners),
                None => {
                    debug!("Escape pressed");
                    engine.overlay.remove(page, &mut engine.listeners);
                }
            }
        }
        disposition
    }

    fn on_media_loaded(self: &Arc<Self>, engine: &mut EngineState, node: NodeId) {
        let Some(overlay) = engine.overlay.current_mut() else {
            return;
        };
        if overlay.surface() != node {
            return;
        }
        let id = overlay.id();
        let shared = Arc::clone(self);
        overlay
            .loaded_timer
            .arm(&self.scope, LOADED_DELAY, move |token| async move {
                shared.with_overlay(id, &token, |page, overlay| overlay.mark_loaded(page));
            });
    }

    fn persist_volume(self: &Arc<Self>, volume: f64) {
        let shared = Arc::clone(self);
        self.scope.spawn(async move {
            if let Err(e) = shared.binding.persist("volume", json!(volume)).await {
                warn!("Could not persist volume: {}", e);
            }
        });
    }

    fn apply_step(
        self: &Arc<Self>,
        engine: &mut EngineState,
        prefs: &Preferences,
        step: HoverStep,
    ) -> EventDisposition {
        if step.cancel_timer {
            engine.hover_timer.cancel();
        }
        self.run_action(engine, prefs, step.action);
        step.disposition
    }

    fn run_action(
        self: &Arc<Self>,
        engine: &mut EngineState,
        prefs: &Preferences,
        action: Option<HoverAction>,
    ) {
        match action {
            Some(HoverAction::Arm(delay)) => self.arm_hover(engine, delay),
            Some(HoverAction::Confirm(link)) => self.open(engine, prefs, link),
            None => {}
        }
    }

    fn arm_hover(self: &Arc<Self>, engine: &mut EngineState, delay: Duration) {
        let shared = Arc::clone(self);
        engine
            .hover_timer
            .arm(&self.scope, delay, move |token| async move {
                shared.on_hover_timer(&token);
            });
    }

    fn on_hover_timer(self: &Arc<Self>, token: &CancellationToken) {
        if !self.lifecycle.is_attached() {
            return;
        }
        let page = self.page.as_ref();
        let mut guard = self.engine.lock();
        if token.is_cancelled() {
            return;
        }
        let engine = &mut *guard;
        engine.hover_timer.clear();
        let prefs = self.binding.prefs().read();
        let action = engine
            .detector
            .on_timer(page, &prefs, &mut engine.listeners);
        self.run_action(engine, &prefs, action);
    }

    fn open(self: &Arc<Self>, engine: &mut EngineState, prefs: &Preferences, link: LinkInfo) {
        let Some(plan) = engine.overlay.begin(self.page.as_ref(), prefs, link) else {
            return;
        };
        let shared = Arc::clone(self);
        self.scope.spawn(shared.load_source(plan));
    }

    fn is_current(&self, id: OverlayId) -> bool {
        self.engine.lock().overlay.is_current(id)
    }

    /// Run `f` on overlay `id` if a timer fire was not cancelled and the
    /// overlay is still live.
    fn with_overlay(
        &self,
        id: OverlayId,
        token: &CancellationToken,
        f: impl FnOnce(&dyn Page, &mut Overlay),
    ) {
        let mut engine = self.engine.lock();
        if token.is_cancelled() {
            return;
        }
        if let Some(overlay) = engine.overlay.get_mut(id) {
            f(self.page.as_ref(), overlay);
        }
    }

    async fn load_source(self: Arc<Self>, plan: SourcePlan) {
        {
            let mut engine = self.engine.lock();
            let Some(overlay) = engine.overlay.get_mut(plan.id) else {
                debug!("{} gone before its source was requested", plan.id);
                return;
            };
            overlay.start_loading();
        }
        let resolved = if plan.indirect {
            self.resolve_indirect(&plan.video_id).await
        } else {
            Some(plan.video_id.clone())
        };
        if !self.is_current(plan.id) {
            debug!("{} gone before its id resolved", plan.id);
            return;
        }
        let Some(video_id) = resolved else {
            self.finish_source(&plan, None);
            return;
        };
        if plan.native && !self.load_native(&plan, &video_id).await {
            return;
        }
        self.finish_source(&plan, Some(&video_id));
    }

    async fn resolve_indirect(&self, indirect_id: &str) -> Option<String> {
        match self.relay.find_id(indirect_id).await {
            Ok(Some(id)) => {
                debug!("Resolved {} to {}", indirect_id, id);
                Some(id)
            }
            Ok(None) => {
                debug!("No video behind {}", indirect_id);
                None
            }
            Err(e) => {
                warn!("Could not resolve {}: {}", indirect_id, e);
                None
            }
        }
    }

    /// Try the native surface. Falls back to the embed frame when there is
    /// nothing to play or the surface does not report it can play in time.
    /// Returns `false` when the overlay went away meanwhile.
    async fn load_native(&self, plan: &SourcePlan, video_id: &str) -> bool {
        let page = self.page.as_ref();
        let candidates = match self.relay.get_video_info(video_id).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("No streams for {}: {}", video_id, e);
                Vec::new()
            }
        };

        let can_play = {
            let mut engine = self.engine.lock();
            let Some(overlay) = engine.overlay.get_mut(plan.id) else {
                return false;
            };
            if candidates.is_empty() {
                overlay.fallback_to_frame(page);
                return true;
            }
            overlay.attach_candidates(page, &candidates)
        };

        let playable = matches!(
            tokio::time::timeout(CAN_PLAY_TIMEOUT, can_play).await,
            Ok(Ok(true))
        );

        let mut engine = self.engine.lock();
        let Some(overlay) = engine.overlay.get_mut(plan.id) else {
            return false;
        };
        if playable {
            overlay.start_native(page, plan.start_seconds);
        } else {
            overlay.fallback_to_frame(page);
        }
        true
    }

    /// Set the embed source (unless playing natively), attach the overlay
    /// and run the post-load side effects. `None` marks a failed resolution.
    fn finish_source(self: &Arc<Self>, plan: &SourcePlan, video_id: Option<&str>) {
        let page = self.page.as_ref();
        let mut guard = self.engine.lock();
        let engine = &mut *guard;
        let prefs = self.binding.prefs().read();
        let Some(overlay) = engine.overlay.get_mut(plan.id) else {
            return;
        };

        match video_id {
            Some(video_id) => {
                if overlay.surface_kind() == SurfaceKind::Frame {
                    overlay.set_embed_source(
                        page,
                        video_id,
                        plan.start_seconds,
                        plan.on_video_host,
                    );
                }
            }
            None => overlay.mark_error(page),
        }
        let finished = overlay.finish_source(page, &prefs, &mut engine.listeners);

        let id = plan.id;
        let shared = Arc::clone(self);
        overlay
            .fade_timer
            .arm(&self.scope, FADE_IN_DELAY, move |token| async move {
                shared.with_overlay(id, &token, |page, overlay| overlay.fade_in(page));
            });

        if prefs.strike {
            strike_links(page, finished.anchor, &finished.href);
        }
        if prefs.history {
            let relay = self.relay.clone();
            let href = finished.href;
            self.scope.spawn(async move {
                if let Err(e) = relay.add_to_history(&href).await {
                    warn!("Could not add {} to the history: {}", href, e);
                }
            });
        }
        info!("{} ready", id);
    }

    fn on_destruct_signal(&self) -> EventDisposition {
        if !self
            .engine
            .lock()
            .listeners
            .is_enabled(ListenerKind::DestructSignal)
        {
            return EventDisposition::pass();
        }
        if self.runtime.is_context_alive() {
            warn!(
                "Ignoring destruct signal {}: extension context is alive",
                self.runtime.extension_id()
            );
            return EventDisposition::pass();
        }
        info!("Extension context invalidated");
        self.teardown();
        EventDisposition::pass()
    }

    fn teardown(&self) -> bool {
        if !self.lifecycle.begin_teardown() {
            return false;
        }
        {
            let page = self.page.as_ref();
            let mut guard = self.engine.lock();
            let engine = &mut *guard;
            engine.hover_timer.cancel();
            engine.detector.detach(page, &mut engine.listeners);
            engine.overlay.remove(page, &mut engine.listeners);
            engine.listeners.disable_all(page);
        }
        self.scope.cancel();
        self.registry.release(self.frame);
        self.lifecycle.finish_teardown();
        true
    }
}

impl DestructTarget for SessionShared {
    fn destruct_signal(&self) {
        if self.lifecycle.is_attached() {
            self.on_destruct_signal();
        }
    }
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        if self.lifecycle.state() != SessionState::Detached {
            self.scope.cancel();
            self.registry.release(self.frame);
        }
    }
}
