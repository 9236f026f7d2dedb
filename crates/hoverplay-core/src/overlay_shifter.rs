//! Moving and resizing the overlay with the pointer.
//!
//! A drag starts with a pointer-down on the root (move) or on a corner
//! resizer (resize). While it runs a full-viewport fence carries the drag
//! cursor and the session routes document pointer events here. The click
//! that follows the pointer-up is swallowed once, which also removes the
//! fence.

use hoverplay_protocols::{EventDisposition, ListenerKind, NodeId, Page, Point, PointerEvent};
use tracing::debug;

use super::{Overlay, OverlayPhase, SurfaceKind};
use crate::geometry::{Corner, Size, resize_step};
use crate::listeners::ListenerSet;
use crate::styles::{StyleSheet, cursor_rule, fence_rule, px, translate};

/// What a drag changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize(Corner),
}

impl DragKind {
    fn cursor(&self) -> &'static str {
        match self {
            DragKind::Move => "move",
            DragKind::Resize(corner) => corner.cursor(),
        }
    }
}

pub(super) struct Shifter {
    kind: DragKind,
    /// Offset (move) or size (resize) when the drag began.
    origin: Point,
    /// Client position of the pointer-down.
    press: Point,
    /// Last tracked client position.
    last: Point,
}

pub(super) struct Fence {
    host: NodeId,
}

impl Overlay {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_kind(&self) -> Option<DragKind> {
        self.drag.as_ref().map(|shifter| shifter.kind)
    }

    /// Whether the fence of a finished drag still waits for its click.
    pub fn has_fence(&self) -> bool {
        self.fence.is_some()
    }

    fn hit(&self, event: &PointerEvent) -> Option<DragKind> {
        for node in &event.path {
            if let Some((_, corner)) = self.corners.iter().find(|(n, _)| n == node) {
                return Some(DragKind::Resize(*corner));
            }
        }
        (event.target == self.root).then_some(DragKind::Move)
    }

    /// Pointer-down on the overlay. `None` when the event does not start a
    /// drag.
    pub fn begin_drag(
        &mut self,
        page: &dyn Page,
        listeners: &mut ListenerSet,
        event: &PointerEvent,
    ) -> Option<EventDisposition> {
        if self.phase != OverlayPhase::Ready {
            return None;
        }
        let kind = self.hit(event)?;
        // A fence still waiting for its click belongs to the previous drag.
        self.clear_fence(page, listeners);

        let origin = match kind {
            DragKind::Move => self.offset,
            DragKind::Resize(_) => Point::new(self.size.width, self.size.height),
        };
        let press = event.client_point();
        self.drag = Some(Shifter {
            kind,
            origin,
            press,
            last: press,
        });

        page.set_attribute(self.resizers, "class", "moving");
        let cursor = kind.cursor();
        self.cursor_rule = Some(self.sheet.push(cursor_rule(cursor)));
        self.flush_styles(page);
        self.fence = Some(create_fence(page, cursor));
        listeners.enable(page, ListenerKind::DragTracking);

        self.set_phase(match kind {
            DragKind::Move => OverlayPhase::Dragging,
            DragKind::Resize(_) => OverlayPhase::Resizing,
        });
        Some(EventDisposition::consumed())
    }

    /// Pointer move during a drag, in client coordinates.
    pub fn drag_to(&mut self, page: &dyn Page, point: Point) {
        let Some(shifter) = self.drag.as_mut() else {
            return;
        };
        shifter.last = point;
        let (kind, origin, press) = (shifter.kind, shifter.origin, shifter.press);
        match kind {
            DragKind::Move => {
                self.move_to(origin.x + point.x - press.x, origin.y + point.y - press.y);
            }
            DragKind::Resize(corner) => {
                let step = resize_step(
                    origin.x,
                    point.x - press.x,
                    corner,
                    self.offset,
                    self.size,
                    &page.viewport(),
                );
                if let Some(step) = step {
                    self.move_to(step.offset.x, step.offset.y);
                    self.resize_to(step.size);
                }
            }
        }
        self.flush_styles(page);
    }

    /// Pointer-up. In native mode a move drag released where it was
    /// pressed toggles playback.
    pub fn end_drag(
        &mut self,
        page: &dyn Page,
        listeners: &mut ListenerSet,
        up: Option<Point>,
        native: bool,
    ) {
        let Some(shifter) = self.drag.take() else {
            return;
        };
        page.set_attribute(self.resizers, "class", "");
        listeners.disable(page, ListenerKind::DragTracking);
        listeners.enable(page, ListenerKind::ClickConsumer);
        self.set_phase(OverlayPhase::Ready);

        let clicked = up == Some(shifter.press) && shifter.kind == DragKind::Move;
        if native && clicked && self.surface_kind == SurfaceKind::Video {
            if page.media_paused(self.surface) {
                page.media_play(self.surface);
            } else {
                page.media_pause(self.surface);
            }
        }
    }

    /// End the drag where the pointer was last seen.
    pub fn stop_drag(&mut self, page: &dyn Page, listeners: &mut ListenerSet) {
        if let Some(last) = self.drag.as_ref().map(|shifter| shifter.last) {
            debug!("{} drag stopped at {:?}", self.id, last);
            self.drag_to(page, last);
            self.end_drag(page, listeners, None, false);
        }
    }

    /// The click following a drag: swallow it and drop the fence.
    pub fn consume_click(&mut self, page: &dyn Page, listeners: &mut ListenerSet) -> EventDisposition {
        self.clear_fence(page, listeners);
        EventDisposition::consumed()
    }

    pub(super) fn clear_fence(&mut self, page: &dyn Page, listeners: &mut ListenerSet) {
        listeners.disable(page, ListenerKind::ClickConsumer);
        if let Some(fence) = self.fence.take() {
            page.remove_node(fence.host);
        }
        if let Some(rule) = self.cursor_rule.take() {
            self.sheet.remove(rule);
            self.flush_styles(page);
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.offset = Point::new(x, y);
        if let Some(rule) = self.move_rule {
            self.sheet.set_property(rule, "transform", translate(x, y));
        }
    }

    fn resize_to(&mut self, size: Size) {
        self.size = size;
        if let Some(rule) = self.size_rule {
            self.sheet.set_property(rule, "width", px(size.width));
            self.sheet.set_property(rule, "height", px(size.height));
        }
    }
}

fn create_fence(page: &dyn Page, cursor: &str) -> Fence {
    let host = page.create_element("div");
    page.append_child(page.body(), host);
    let shadow = page.attach_shadow(host);
    let style = page.create_element("style");
    let mut sheet = StyleSheet::new();
    sheet.push(fence_rule(cursor));
    page.set_text_content(style, &sheet.render());
    page.append_child(shadow, style);
    Fence { host }
}
