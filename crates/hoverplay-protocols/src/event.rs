//! Page events forwarded by the host into the engine.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Point};

/// Mouse button of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
}

/// A mouse event as seen by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// `event.target`, retargeted to the shadow host for closed roots.
    pub target: NodeId,
    /// `event.composedPath()` without window/document, innermost first.
    #[serde(default)]
    pub path: Vec<NodeId>,
    pub page_x: f64,
    pub page_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub shift_key: bool,
}

impl PointerEvent {
    pub fn page_point(&self) -> Point {
        Point::new(self.page_x, self.page_y)
    }

    pub fn client_point(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// A keyboard event as seen by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyEvent {
    /// `event.key`, e.g. `"a"`, `"Control"`.
    pub key: String,
    /// `event.code`, e.g. `"KeyA"`, `"Escape"`.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    /// Chord name used for hotkey matching: `Ctrl-`, `Alt-`, `Shift-`
    /// prefixes followed by the key. A bare modifier press yields only the
    /// modifier names (`"Ctrl"`, `"Ctrl-Shift"`).
    pub fn chord(&self) -> String {
        let mut chord = String::new();
        if self.ctrl_key {
            chord.push_str("Ctrl-");
        }
        if self.alt_key {
            chord.push_str("Alt-");
        }
        if self.shift_key {
            chord.push_str("Shift-");
        }
        match self.key.as_str() {
            "Control" | "Alt" | "Shift" => {
                chord.pop();
                chord
            }
            key => {
                chord.push_str(key);
                chord
            }
        }
    }
}

/// Every event the engine reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    PointerOver(PointerEvent),
    PointerEnter(PointerEvent),
    PointerLeave(PointerEvent),
    PointerMove(PointerEvent),
    PointerDown(PointerEvent),
    PointerUp(PointerEvent),
    Click(PointerEvent),
    KeyDown(KeyEvent),
    SelectionChange,
    /// A mutation record batch from the body observer.
    Mutation,
    /// `load` fired on a media surface (frame or video).
    MediaLoaded { node: NodeId },
    /// `canplay` fired on a native video surface.
    MediaCanPlay { node: NodeId },
    /// `error` fired on a native video surface.
    MediaError { node: NodeId },
    VolumeChange { node: NodeId, volume: f64 },
    /// Reinjection custom event; may be forged by the page.
    DestructSignal,
}

/// What the host must do with the event after the engine handled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDisposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventDisposition {
    /// Neither default action nor propagation is touched.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Only stop propagation.
    pub fn claimed() -> Self {
        Self {
            prevent_default: false,
            stop_propagation: true,
        }
    }

    /// Prevent default and stop propagation.
    pub fn consumed() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
