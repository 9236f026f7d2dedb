//! Source loading steps of an overlay.

use hoverplay_config::Preferences;
use hoverplay_protocols::{ListenerKind, NodeId, Page, Point, StreamCandidate};
use tokio::sync::oneshot;
use tracing::debug;

use super::{Overlay, OverlayId, OverlayPhase, SurfaceKind, create_frame};
use crate::geometry::Size;
use crate::link::embed_url;
use crate::listeners::ListenerSet;
use crate::styles::{Rule, error_rule, size_rule};

/// What the session needs to load the source of a new overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub id: OverlayId,
    /// Direct id, or the indirect id still to be resolved.
    pub video_id: String,
    pub indirect: bool,
    pub start_seconds: u64,
    pub native: bool,
    pub on_video_host: bool,
}

/// The overlay is attached; post-load side effects can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSource {
    pub id: OverlayId,
    pub anchor: NodeId,
    pub href: String,
    pub errored: bool,
}

impl Overlay {
    /// The load task picked up the plan; `false` if it already had.
    pub fn start_loading(&mut self) -> bool {
        if self.phase != OverlayPhase::Creating {
            return false;
        }
        self.set_phase(OverlayPhase::SourceLoading);
        true
    }

    /// Append stream candidates as `source` children of the native surface.
    /// The receiver yields whether the surface could play.
    pub fn attach_candidates(
        &mut self,
        page: &dyn Page,
        candidates: &[StreamCandidate],
    ) -> oneshot::Receiver<bool> {
        for candidate in candidates {
            let source = page.create_element("source");
            page.set_attribute(source, "src", &candidate.src);
            page.set_attribute(source, "title", &candidate.title);
            page.append_child(self.surface, source);
        }
        let (tx, rx) = oneshot::channel();
        self.can_play = Some(tx);
        rx
    }

    /// `canplay` (`true`) or `error` (`false`) of the surface.
    pub fn signal_can_play(&mut self, node: NodeId, can_play: bool) -> bool {
        if node != self.surface || self.surface_kind != SurfaceKind::Video {
            return false;
        }
        match self.can_play.take() {
            Some(tx) => tx.send(can_play).is_ok(),
            None => false,
        }
    }

    pub fn start_native(&mut self, page: &dyn Page, start_seconds: u64) {
        debug!("{} playing natively from {}s", self.id, start_seconds);
        page.media_play(self.surface);
        page.media_set_current_time(self.surface, start_seconds as f64);
    }

    /// Replace the native surface by an embed frame.
    pub fn fallback_to_frame(&mut self, page: &dyn Page) {
        if self.surface_kind == SurfaceKind::Frame {
            return;
        }
        debug!("{} cannot play natively; falling back to the embed frame", self.id);
        let frame = create_frame(page);
        page.replace_node(self.surface, frame);
        self.surface = frame;
        self.surface_kind = SurfaceKind::Frame;
        self.can_play = None;
    }

    pub fn set_embed_source(
        &mut self,
        page: &dyn Page,
        video_id: &str,
        start_seconds: u64,
        on_video_host: bool,
    ) {
        let src = embed_url(video_id, start_seconds, on_video_host);
        debug!("{} source {}", self.id, src);
        page.set_attribute(self.surface, "src", &src);
    }

    /// The id could not be resolved: show the error background.
    pub fn mark_error(&mut self, page: &dyn Page) {
        debug!("{} has no playable source", self.id);
        self.errored = true;
        self.sheet.push(error_rule());
        self.flush_styles(page);
    }

    /// End source loading: restore the link, attach the root and make the
    /// overlay interactive.
    pub fn finish_source(
        &mut self,
        page: &dyn Page,
        prefs: &Preferences,
        listeners: &mut ListenerSet,
    ) -> FinishedSource {
        self.hide_progress(page);
        page.append_child(page.body(), self.root);

        self.offset = Point::default();
        self.move_rule = Some(self.sheet.push(Rule::host()));
        self.size = Size::for_width(prefs.width);
        self.size_rule = Some(self.sheet.push(size_rule(self.size)));
        self.flush_styles(page);

        self.set_phase(OverlayPhase::Ready);
        listeners.enable(page, ListenerKind::DismissClick);
        listeners.enable(page, ListenerKind::DismissKey);

        FinishedSource {
            id: self.id,
            anchor: self.link.anchor,
            href: self.link.href.clone(),
            errored: self.errored,
        }
    }
}
