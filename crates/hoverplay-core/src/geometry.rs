//! Overlay placement and resize geometry.
//!
//! Pure functions over page rectangles and the viewport. Anchored overlays
//! are positioned in page coordinates below their link; centered overlays
//! are fixed relative to the window.

use hoverplay_config::{MIN_OVERLAY_WIDTH, Preferences};
use hoverplay_protocols::{Point, Rect, ScrollBehavior, ScrollRequest, Viewport};

pub const ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Margin kept between the overlay and the viewport edge.
const EDGE_MARGIN: f64 = 10.0;

/// Room reserved for a vertical scrollbar.
const SCROLLBAR_ALLOWANCE: f64 = 30.0;

/// Overlay size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// A 16:9 size for `width`, height rounded to whole pixels.
    pub fn for_width(width: f64) -> Self {
        Self {
            width,
            height: height_for(width),
        }
    }
}

pub fn height_for(width: f64) -> f64 {
    (width / ASPECT_RATIO).round()
}

/// Where an anchored overlay goes, plus the scroll that reveals it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    /// Unrounded 16:9 height used for the placement math.
    pub height: f64,
    pub scroll: Option<ScrollRequest>,
}

/// Place an overlay below `rect` (viewport-relative bounding rectangle).
pub fn anchored_placement(rect: Rect, viewport: &Viewport, prefs: &Preferences) -> AnchoredPlacement {
    let w = prefs.width;
    let h = w / ASPECT_RATIO;
    let scrollbar = if viewport.has_vertical_scrollbar() {
        SCROLLBAR_ALLOWANCE
    } else {
        0.0
    };
    let max_left = viewport.scroll_x + viewport.inner_width - w - EDGE_MARGIN - scrollbar;
    let left = (rect.left + viewport.scroll_x + prefs.relative_x)
        .min(max_left)
        .max(0.0);
    let top = (rect.bottom() + viewport.scroll_y + prefs.relative_y).max(0.0);

    let scroll = if prefs.scroll {
        reveal_scroll(left, top, w, h, viewport, prefs.smooth)
    } else {
        None
    };

    AnchoredPlacement {
        left,
        top,
        width: w,
        height: h,
        scroll,
    }
}

/// The scroll that brings a `w`x`h` box at page position (`left`, `top`)
/// into view, or `None` when it is already visible.
pub fn reveal_scroll(
    left: f64,
    top: f64,
    w: f64,
    h: f64,
    viewport: &Viewport,
    smooth: bool,
) -> Option<ScrollRequest> {
    let reveal_x = left < viewport.scroll_x || left + w > viewport.inner_width + viewport.scroll_x;
    let reveal_top = top < viewport.scroll_y;
    let reveal_bottom = top + h > viewport.inner_height + viewport.scroll_y;
    if !reveal_x && !reveal_top && !reveal_bottom {
        return None;
    }

    let target_top = if reveal_top {
        top - EDGE_MARGIN
    } else if reveal_bottom {
        top + h - viewport.inner_height + EDGE_MARGIN
    } else {
        viewport.scroll_y
    };
    Some(ScrollRequest {
        left: if reveal_x { left } else { viewport.scroll_x },
        top: target_top.max(0.0),
        behavior: if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Auto
        },
    })
}

/// Offsets subtracted from `50%` for a window-centered overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredPlacement {
    pub left_offset: f64,
    pub top_offset: f64,
}

pub fn centered_placement(prefs: &Preferences) -> CenteredPlacement {
    CenteredPlacement {
        left_offset: prefs.width / 2.0 - prefs.center_x,
        top_offset: prefs.width / ASPECT_RATIO / 2.0 - prefs.center_y,
    }
}

/// Clamp a requested width to the resize bounds.
pub fn clamp_width(width: f64, viewport: &Viewport) -> f64 {
    width
        .max(MIN_OVERLAY_WIDTH)
        .min(viewport.inner_width)
        .min(viewport.inner_height * ASPECT_RATIO)
}

/// Which corner a resize is dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub left: bool,
    pub top: bool,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner { left: true, top: true },
        Corner { left: false, top: true },
        Corner { left: false, top: false },
        Corner { left: true, top: false },
    ];

    /// The resizer's `class` attribute.
    pub fn class_name(&self) -> &'static str {
        match (self.top, self.left) {
            (true, true) => "top left",
            (true, false) => "top right",
            (false, false) => "bottom right",
            (false, true) => "bottom left",
        }
    }

    /// Drag cursor: `ne-resize` when exactly one of left/top is set.
    pub fn cursor(&self) -> &'static str {
        if self.left ^ self.top {
            "ne-resize"
        } else {
            "nw-resize"
        }
    }
}

/// Result of one resize step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeStep {
    pub offset: Point,
    pub size: Size,
}

/// One pointer move of a resize drag.
///
/// `start_width` is the width when the drag began, `delta_x` the pointer
/// travel since then. Dragging a left or top corner shifts the offset so the
/// opposite edges stay put. `None` when the size would not change.
pub fn resize_step(
    start_width: f64,
    delta_x: f64,
    corner: Corner,
    offset: Point,
    size: Size,
    viewport: &Viewport,
) -> Option<ResizeStep> {
    let direction = if corner.left { -1.0 } else { 1.0 };
    let next = Size::for_width(clamp_width(start_width + delta_x * direction, viewport));
    let dw = next.width - size.width;
    let dh = next.height - size.height;
    if dw == 0.0 && dh == 0.0 {
        return None;
    }
    let shift = |flag: bool, d: f64| if flag { d } else { 0.0 };
    Some(ResizeStep {
        offset: Point::new(
            offset.x - shift(corner.left, dw),
            offset.y - shift(corner.top, dh),
        ),
        size: next,
    })
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
