//! Overlay player controller.
//!
//! Owns the single floating player: its DOM (a root element with a closed
//! shadow root holding a style element, the media surface and four corner
//! resizers), its structured style sheet and its phase.
//!
//! ```text
//! Absent -> Creating -> SourceLoading -> Ready <-> Dragging/Resizing -> Removed
//! ```
//!
//! An overlay stays `Creating` from [`OverlayController::begin`] until the
//! session's load task takes up its [`SourcePlan`].
//!
//! Source loading and drag handling live in `overlay_source.rs` and
//! `overlay_shifter.rs`; the async orchestration of a load is done by the
//! session, which re-checks [`OverlayController::is_current`] after every
//! suspension point.

use std::fmt;
use std::time::Duration;

use hoverplay_config::{PlacementMode, Preferences};
use hoverplay_protocols::{ListenerKind, NodeId, Page, Point};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::geometry::{Corner, Size, anchored_placement, centered_placement};
use crate::link::{LinkInfo, VIDEO_HOST};
use crate::listeners::ListenerSet;
use crate::styles::{
    RuleId, StyleSheet, anchored_rule, centered_rule, dark_rule, fade_in_rule, loaded_rule,
    main_rules,
};
use crate::timer::TimerSlot;

#[path = "overlay_shifter.rs"]
mod shifter;
#[path = "overlay_source.rs"]
mod source;

pub use shifter::DragKind;
pub use source::{FinishedSource, SourcePlan};

use shifter::{Fence, Shifter};

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;

/// Delay between attaching the root and fading it in.
pub const FADE_IN_DELAY: Duration = Duration::from_millis(250);

/// Time after the surface loaded until the placeholder background goes.
pub const LOADED_DELAY: Duration = Duration::from_secs(10);

/// How long a native surface gets to signal it can play.
pub const CAN_PLAY_TIMEOUT: Duration = Duration::from_millis(2000);

const FRAME_SANDBOX: &str = "allow-scripts allow-same-origin allow-presentation allow-popups";
const PROGRESS_CURSOR: &str = "progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Absent,
    /// DOM built and styled, source not requested yet.
    Creating,
    SourceLoading,
    Ready,
    Dragging,
    Resizing,
    Removed,
}

/// The media element inside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Sandboxed embed frame.
    Frame,
    /// Native video element playing raw streams.
    Video,
}

/// The live overlay.
pub struct Overlay {
    id: OverlayId,
    phase: OverlayPhase,
    link: LinkInfo,
    root: NodeId,
    style: NodeId,
    surface: NodeId,
    surface_kind: SurfaceKind,
    resizers: NodeId,
    corners: [(NodeId, Corner); 4],
    sheet: StyleSheet,
    move_rule: Option<RuleId>,
    size_rule: Option<RuleId>,
    offset: Point,
    size: Size,
    errored: bool,
    /// Inline cursor of the link before the progress cursor replaced it.
    saved_cursor: Option<Option<String>>,
    drag: Option<Shifter>,
    fence: Option<Fence>,
    cursor_rule: Option<RuleId>,
    can_play: Option<oneshot::Sender<bool>>,
    pub(crate) fade_timer: TimerSlot,
    pub(crate) loaded_timer: TimerSlot,
}

impl Overlay {
    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn link(&self) -> &LinkInfo {
        &self.link
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn style_node(&self) -> NodeId {
        self.style
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    pub fn surface_kind(&self) -> SurfaceKind {
        self.surface_kind
    }

    pub fn resizers(&self) -> NodeId {
        self.resizers
    }

    pub fn corner_node(&self, corner: Corner) -> Option<NodeId> {
        self.corners
            .iter()
            .find(|(_, c)| *c == corner)
            .map(|(node, _)| *node)
    }

    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Offset applied by move drags.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    pub fn fade_in(&mut self, page: &dyn Page) {
        self.sheet.push(fade_in_rule());
        self.flush_styles(page);
    }

    pub fn mark_loaded(&mut self, page: &dyn Page) {
        self.sheet.push(loaded_rule());
        self.flush_styles(page);
    }

    fn set_phase(&mut self, phase: OverlayPhase) {
        debug!("{} {:?} -> {:?}", self.id, self.phase, phase);
        self.phase = phase;
    }

    fn flush_styles(&self, page: &dyn Page) {
        page.set_text_content(self.style, &self.sheet.render());
    }

    /// Restore the link's cursor and drop an emptied style attribute.
    fn hide_progress(&mut self, page: &dyn Page) {
        let anchor = self.link.anchor;
        if let Some(previous) = self.saved_cursor.take() {
            if page.style_property(anchor, "cursor").as_deref() == Some(PROGRESS_CURSOR) {
                match previous {
                    Some(cursor) => page.set_style_property(anchor, "cursor", &cursor, false),
                    None => page.remove_style_property(anchor, "cursor"),
                }
            }
        }
        if page.style_len(anchor) == 0 && page.has_attribute(anchor, "style") {
            page.remove_attribute(anchor, "style");
        }
    }
}

/// Holds at most one [`Overlay`].
#[derive(Default)]
pub struct OverlayController {
    slot: Option<Overlay>,
    next_id: u64,
}

impl OverlayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> OverlayPhase {
        self.slot
            .as_ref()
            .map_or(OverlayPhase::Absent, |overlay| overlay.phase)
    }

    pub fn exists(&self) -> bool {
        self.slot.is_some()
    }

    pub fn current(&self) -> Option<&Overlay> {
        self.slot.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Overlay> {
        self.slot.as_mut()
    }

    /// The overlay `id` is still the live one.
    pub fn is_current(&self, id: OverlayId) -> bool {
        self.slot.as_ref().is_some_and(|overlay| overlay.id == id)
    }

    /// Current overlay, if it is `id`.
    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.slot.as_mut().filter(|overlay| overlay.id == id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.slot.as_ref().map(|overlay| overlay.root)
    }

    pub fn is_dragging(&self) -> bool {
        self.slot.as_ref().is_some_and(Overlay::is_dragging)
    }

    /// Build the overlay for a confirmed intent. `None` when one already
    /// exists, whatever its phase.
    pub fn begin(
        &mut self,
        page: &dyn Page,
        prefs: &Preferences,
        link: LinkInfo,
    ) -> Option<SourcePlan> {
        if let Some(current) = &self.slot {
            debug!(
                "{} is {:?}; intent on {} ignored",
                current.id, current.phase, link.video_id
            );
            return None;
        }

        self.next_id += 1;
        let id = OverlayId(self.next_id);
        let on_video_host = page.hostname() == VIDEO_HOST;

        let root = page.create_element("div");
        let shadow = page.attach_shadow(root);
        let style = page.create_element("style");
        let (surface, surface_kind) = if prefs.native {
            (create_video(page, prefs.volume), SurfaceKind::Video)
        } else {
            (create_frame(page), SurfaceKind::Frame)
        };
        let resizers = page.create_element("div");
        page.set_attribute(resizers, "id", "resizers");
        let corners = Corner::ALL.map(|corner| {
            let node = page.create_element("div");
            page.set_attribute(node, "class", corner.class_name());
            page.append_child(resizers, node);
            (node, corner)
        });
        page.append_child(shadow, style);
        page.append_child(shadow, surface);
        page.append_child(shadow, resizers);

        let mut sheet = StyleSheet::new();
        sheet.extend(main_rules());
        if prefs.dark {
            sheet.push(dark_rule());
        }
        match prefs.mode {
            PlacementMode::Centered => {
                sheet.push(centered_rule(&centered_placement(prefs)));
            }
            PlacementMode::Anchored => {
                let placement =
                    anchored_placement(page.bounding_rect(link.anchor), &page.viewport(), prefs);
                if let Some(scroll) = placement.scroll {
                    page.scroll_to(scroll);
                }
                sheet.push(anchored_rule(&placement));
            }
        }

        // Only a relay round trip makes the wait visible.
        let saved_cursor = (link.indirect || prefs.native).then(|| {
            let previous = page.style_property(link.anchor, "cursor");
            page.set_style_property(link.anchor, "cursor", PROGRESS_CURSOR, true);
            previous
        });

        let plan = SourcePlan {
            id,
            video_id: link.video_id.clone(),
            indirect: link.indirect,
            start_seconds: link.start_seconds,
            native: prefs.native,
            on_video_host,
        };

        let mut overlay = Overlay {
            id,
            phase: OverlayPhase::Creating,
            link,
            root,
            style,
            surface,
            surface_kind,
            resizers,
            corners,
            sheet,
            move_rule: None,
            size_rule: None,
            offset: Point::default(),
            size: Size::for_width(prefs.width),
            errored: false,
            saved_cursor,
            drag: None,
            fence: None,
            cursor_rule: None,
            can_play: None,
            fade_timer: TimerSlot::new(),
            loaded_timer: TimerSlot::new(),
        };
        overlay.flush_styles(page);
        info!("{} created for {}", id, overlay.link.href);
        self.slot = Some(overlay);
        Some(plan)
    }

    /// Dismiss the overlay: end any drag, detach its DOM, reset to absent.
    pub fn remove(&mut self, page: &dyn Page, listeners: &mut ListenerSet) -> bool {
        listeners.disable(page, ListenerKind::DismissClick);
        listeners.disable(page, ListenerKind::DismissKey);
        let Some(mut overlay) = self.slot.take() else {
            return false;
        };

        if overlay.is_dragging() {
            overlay.stop_drag(page, listeners);
        }
        overlay.clear_fence(page, listeners);
        overlay.hide_progress(page);
        overlay.fade_timer.cancel();
        overlay.loaded_timer.cancel();
        overlay.can_play = None;
        page.remove_node(overlay.root);
        overlay.set_phase(OverlayPhase::Removed);
        info!("{} removed", overlay.id);
        true
    }
}

/// Strike through every anchor sharing `href`, and the trigger itself.
pub fn strike_links(page: &dyn Page, trigger: NodeId, href: &str) {
    let mut anchors = page.anchors_with_href(href);
    if !anchors.contains(&trigger) {
        anchors.push(trigger);
    }
    for anchor in anchors {
        page.set_style_property(anchor, "text-decoration", "line-through", false);
    }
}

fn create_frame(page: &dyn Page) -> NodeId {
    let frame = page.create_element("iframe");
    page.set_attribute(frame, "allowfullscreen", "");
    page.set_attribute(frame, "sandbox", FRAME_SANDBOX);
    frame
}

fn create_video(page: &dyn Page, volume: f64) -> NodeId {
    let video = page.create_element("video");
    page.set_attribute(video, "autoplay", "");
    page.set_attribute(video, "controls", "");
    page.media_set_volume(video, volume);
    video
}
