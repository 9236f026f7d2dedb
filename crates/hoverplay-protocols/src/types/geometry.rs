//! Geometry value types: points, rectangles, viewport and scroll requests.

use serde::{Deserialize, Serialize};

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Client-relative bounding rectangle, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Viewport and scroll state of the host window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// `window.scrollX`.
    pub scroll_x: f64,
    /// `window.scrollY`.
    pub scroll_y: f64,
    /// `window.innerWidth`.
    pub inner_width: f64,
    /// `window.innerHeight`.
    pub inner_height: f64,
    /// Scroll height of the scrolling element.
    pub scroll_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            inner_width: 1280.0,
            inner_height: 720.0,
            scroll_height: 720.0,
        }
    }
}

impl Viewport {
    /// Whether the document is taller than the window, i.e. shows a vertical scrollbar.
    pub fn has_vertical_scrollbar(&self) -> bool {
        self.scroll_height > self.inner_height
    }
}

/// How a scroll request should be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Absolute scroll target in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub left: f64,
    pub top: f64,
    pub behavior: ScrollBehavior,
}
