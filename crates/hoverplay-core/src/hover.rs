//! Hover-intent detection.
//!
//! Decides when hovering (or a hotkey press over) a video link means the
//! user wants a player. A pointer-over on a classified link starts an
//! intent; the session arms the delay timer the detector asks for and calls
//! back into [`HoverIntentDetector::on_timer`] when it fires. The detector
//! itself owns no timers, which keeps every decision synchronous and
//! testable without a runtime.

use std::time::Duration;

use hoverplay_config::Preferences;
use hoverplay_protocols::{
    EventDisposition, KeyEvent, ListenerKind, MouseButton, NodeId, Page, Point, PointerEvent,
};
use tracing::debug;

use crate::link::{LINK_FRAGMENTS, LinkInfo, VIDEO_HOST, classify_anchor, find_anchor};
use crate::listeners::ListenerSet;

#[cfg(test)]
#[path = "hover_tests.rs"]
mod tests;

/// Attributes of the hover toolbars inside video-host thumbnails.
const TOOLBAR_ATTRIBUTES: [&str; 2] = ["overlay-style", "system-icons"];

/// What the session must do after the detector handled an event.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverAction {
    /// (Re-)arm the delay timer.
    Arm(Duration),
    /// The intent is confirmed: open a player for this link.
    Confirm(LinkInfo),
}

/// Outcome of one detector event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverStep {
    pub disposition: EventDisposition,
    /// Cancel the pending delay timer.
    pub cancel_timer: bool,
    pub action: Option<HoverAction>,
}

/// Outcome of a pointer-down or click routed through the detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    pub cancel_timer: bool,
    /// Dismiss the current overlay.
    pub dismiss: bool,
}

#[derive(Debug, Clone)]
struct PendingIntent {
    link: LinkInfo,
    target: NodeId,
    focus: bool,
    url: String,
}

pub struct HoverIntentDetector {
    on_video_host: bool,
    /// The listener the detector wants registered, if active.
    bound: Option<ListenerKind>,
    /// Hotkey chord while hotkey mode is on.
    hotkey: Option<String>,
    /// No video link on the page; waiting for a mutation.
    suspended: bool,
    last_point: Point,
    last_link: Option<NodeId>,
    bad_bubble_path: Vec<NodeId>,
    pending: Option<PendingIntent>,
    distance: f64,
}

impl HoverIntentDetector {
    pub fn new(page: &dyn Page) -> Self {
        Self {
            on_video_host: page.hostname() == VIDEO_HOST,
            bound: None,
            hotkey: None,
            suspended: false,
            last_point: Point::new(f64::INFINITY, f64::INFINITY),
            last_link: None,
            bad_bubble_path: Vec::new(),
            pending: None,
            distance: 0.0,
        }
    }

    pub fn on_video_host(&self) -> bool {
        self.on_video_host
    }

    pub fn bound(&self) -> Option<ListenerKind> {
        self.bound
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Pointer travel since the delay timer was last armed.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Register the listener the preferences call for, replacing the
    /// current one. Returns `true` when a pending intent was aborted.
    pub fn rebind(&mut self, page: &dyn Page, prefs: &Preferences, listeners: &mut ListenerSet) -> bool {
        let active = !self.on_video_host || (prefs.youtube && page.is_top_frame());
        self.hotkey = prefs.hotkey_chord().map(str::to_string);
        let desired = active.then(|| {
            if self.hotkey.is_some() {
                ListenerKind::HotkeyDown
            } else {
                ListenerKind::PointerOver
            }
        });
        if desired == self.bound {
            return false;
        }

        debug!("Hover listener {:?} -> {:?}", self.bound, desired);
        if let Some(old) = self.bound {
            listeners.disable(page, old);
        }
        self.bound = desired;
        match desired {
            Some(kind) => {
                if !self.suspended {
                    listeners.enable(page, kind);
                }
                false
            }
            None => {
                if self.suspended {
                    self.suspended = false;
                    page.observe_mutations(false);
                }
                self.stop_all(page, listeners)
            }
        }
    }

    /// Drop the listener and any pending intent.
    pub fn detach(&mut self, page: &dyn Page, listeners: &mut ListenerSet) {
        self.stop_all(page, listeners);
        if let Some(kind) = self.bound.take() {
            listeners.disable(page, kind);
        }
        if self.suspended {
            self.suspended = false;
            page.observe_mutations(false);
        }
    }

    pub fn on_pointer_over(
        &mut self,
        page: &dyn Page,
        prefs: &Preferences,
        listeners: &mut ListenerSet,
        event: &PointerEvent,
        overlay_exists: bool,
    ) -> HoverStep {
        let mut step = HoverStep {
            cancel_timer: self.stop_all(page, listeners),
            ..Default::default()
        };
        if overlay_exists || self.shift_rejected(event.shift_key) {
            return step;
        }
        let point = event.page_point();
        if point == self.last_point {
            return step;
        }
        self.last_point = point;

        let target = event.target;
        if let Some(pos) = self.bad_bubble_path.iter().position(|n| *n == target) {
            self.bad_bubble_path.drain(..=pos);
        } else {
            self.bad_bubble_path = event.path.iter().skip(1).copied().collect();
            if let Some(link) = self.classify(page, target, &event.path) {
                debug!("Hover intent on {} ({})", link.video_id, link.href);
                step.disposition = EventDisposition::claimed();
                self.start(page, link, target);
                listeners.enable(page, ListenerKind::PointerMove);
                listeners.enable(page, ListenerKind::PointerDown);
                step.action = Some(HoverAction::Arm(prefs.delay_duration()));
            }
        }

        self.check_links(page, listeners);
        step
    }

    pub fn on_key(
        &mut self,
        page: &dyn Page,
        prefs: &Preferences,
        listeners: &mut ListenerSet,
        event: &KeyEvent,
        overlay_exists: bool,
    ) -> HoverStep {
        let mut step = HoverStep {
            cancel_timer: self.stop_all(page, listeners),
            ..Default::default()
        };
        let Some(hotkey) = self.hotkey.clone() else {
            return step;
        };
        if overlay_exists
            || self.shift_rejected(event.shift_key)
            || event.repeat
            || event.chord() != hotkey
        {
            return step;
        }
        step.disposition.prevent_default = true;

        // `:hover` chain is outermost first; paths run innermost first.
        let mut path = page.hovered_chain();
        path.reverse();
        if let Some(&target) = path.first() {
            if let Some(link) = self.classify(page, target, &path) {
                debug!("Hotkey intent on {} ({})", link.video_id, link.href);
                step.disposition.stop_propagation = true;
                self.start(page, link, target);
                step.action = self.on_timer(page, prefs, listeners);
            }
        }

        self.check_links(page, listeners);
        step
    }

    /// Track pointer travel while an intent is pending.
    pub fn on_pointer_move(
        &mut self,
        page: &dyn Page,
        listeners: &mut ListenerSet,
        event: &PointerEvent,
    ) -> HoverStep {
        if self.on_video_host && self.in_hover_toolbar(page, event.target) {
            debug!("Pointer entered a thumbnail toolbar; intent aborted");
            return HoverStep {
                cancel_timer: self.stop_all(page, listeners),
                ..Default::default()
            };
        }
        let point = event.page_point();
        self.distance += self.last_point.distance_to(point);
        self.last_point = point;
        HoverStep::default()
    }

    /// The delay timer fired.
    pub fn on_timer(
        &mut self,
        page: &dyn Page,
        prefs: &Preferences,
        listeners: &mut ListenerSet,
    ) -> Option<HoverAction> {
        self.pending.as_ref()?;
        if self.distance > prefs.max_movement {
            debug!("Pointer moved {:.1}px; re-arming", self.distance);
            self.distance = 0.0;
            return Some(HoverAction::Arm(prefs.delay_duration()));
        }

        let pending = self.pending.take()?;
        listeners.disable(page, ListenerKind::PointerMove);
        listeners.disable(page, ListenerKind::PointerDown);

        let still_there = pending.focus == page.has_focus()
            && page.is_hovered(pending.target)
            && page.is_hovered(pending.link.anchor)
            && pending.url == page.location();
        if still_there {
            Some(HoverAction::Confirm(pending.link))
        } else {
            debug!("Hover intent on {} dropped", pending.link.video_id);
            None
        }
    }

    /// A pointer-down while pending, or a click while an overlay is shown.
    pub fn on_click(
        &mut self,
        page: &dyn Page,
        listeners: &mut ListenerSet,
        event: &PointerEvent,
        overlay_root: Option<NodeId>,
    ) -> ClickOutcome {
        let cancel_timer = self.stop_all(page, listeners);
        self.last_point = event.page_point();
        let dismiss = overlay_root
            .is_some_and(|root| event.button != MouseButton::Secondary && event.target != root);
        ClickOutcome {
            cancel_timer,
            dismiss,
        }
    }

    /// The body changed while suspended: listen again.
    pub fn on_mutation(&mut self, page: &dyn Page, listeners: &mut ListenerSet) {
        if !self.suspended {
            return;
        }
        debug!("Document mutated; hover listener re-armed");
        self.suspended = false;
        page.observe_mutations(false);
        if let Some(kind) = self.bound {
            listeners.enable(page, kind);
        }
    }

    /// Abort any pending intent. Returns `true` when the timer must be
    /// cancelled.
    pub fn stop_all(&mut self, page: &dyn Page, listeners: &mut ListenerSet) -> bool {
        listeners.disable(page, ListenerKind::PointerMove);
        listeners.disable(page, ListenerKind::PointerDown);
        self.pending.take().is_some()
    }

    fn shift_rejected(&self, shift_key: bool) -> bool {
        shift_key && self.hotkey.as_deref() != Some("Shift")
    }

    fn classify(&self, page: &dyn Page, target: NodeId, path: &[NodeId]) -> Option<LinkInfo> {
        find_anchor(page, target, path, self.on_video_host)
            .and_then(|anchor| classify_anchor(page, anchor))
    }

    fn start(&mut self, page: &dyn Page, link: LinkInfo, target: NodeId) {
        self.last_link = Some(link.anchor);
        self.distance = 0.0;
        self.pending = Some(PendingIntent {
            link,
            target,
            focus: page.has_focus(),
            url: page.location(),
        });
    }

    /// Off the video host, stop listening while the page has no video link.
    fn check_links(&mut self, page: &dyn Page, listeners: &mut ListenerSet) {
        if self.on_video_host {
            return;
        }
        self.last_link = self
            .last_link
            .filter(|link| page.contains(*link))
            .or_else(|| page.find_link(&LINK_FRAGMENTS));
        if self.last_link.is_some() || self.suspended {
            return;
        }
        debug!("No video links on the page; observing mutations");
        if let Some(kind) = self.bound {
            listeners.disable(page, kind);
        }
        self.suspended = true;
        page.observe_mutations(true);
    }

    fn in_hover_toolbar(&self, page: &dyn Page, target: NodeId) -> bool {
        let mut node = Some(target);
        while let Some(current) = node {
            let parent = page.parent(current);
            if TOOLBAR_ATTRIBUTES
                .iter()
                .any(|attr| page.has_attribute(current, attr))
                && has_anchor_ancestor(page, parent)
            {
                return true;
            }
            node = parent;
        }
        false
    }
}

fn has_anchor_ancestor(page: &dyn Page, mut node: Option<NodeId>) -> bool {
    while let Some(current) = node {
        if page.local_name(current).as_deref() == Some("a") {
            return true;
        }
        node = page.parent(current);
    }
    false
}
