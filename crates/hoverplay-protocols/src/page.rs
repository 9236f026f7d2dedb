//! Page protocol definitions.
//!
//! The [`Page`] trait is the engine's only window onto the host document. A
//! browser binding implements it over the real DOM; tests and the replay CLI
//! implement it over an in-memory document.
//!
//! Every call is synchronous and must not dispatch events back into the
//! engine. Events are delivered separately through the session's `dispatch`.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Rect, ScrollRequest, Viewport};

/// Event listener registrations the engine toggles on the host.
///
/// A host only needs to forward events whose listener is enabled; the
/// session also ignores events for disabled listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Passive `mouseover` on the window: starts hover intents.
    PointerOver,
    /// Capturing `keydown` on the window: starts hotkey intents.
    HotkeyDown,
    /// `mousemove` while an intent is pending.
    PointerMove,
    /// `mousedown` while an intent is pending.
    PointerDown,
    /// Document `click` while an overlay is shown.
    DismissClick,
    /// Document `keydown` while an overlay is shown.
    DismissKey,
    /// Document `mousemove`/`mouseup`/`selectionchange` and capturing
    /// `mouseenter`/`mouseleave`/`mouseover` while dragging.
    DragTracking,
    /// One-shot capturing `click` swallowed after a drag ends.
    ClickConsumer,
    /// The reinjection custom event carrying the destruct signal.
    DestructSignal,
}

/// The host document as seen by the engine.
pub trait Page: Send + Sync {
    /// `location.href`.
    fn location(&self) -> String;

    /// `location.hostname`.
    fn hostname(&self) -> String;

    /// Whether this frame is the top-level browsing context.
    fn is_top_frame(&self) -> bool;

    /// `document.hasFocus()`.
    fn has_focus(&self) -> bool;

    fn viewport(&self) -> Viewport;

    fn scroll_to(&self, request: ScrollRequest);

    /// Lower-case tag name, `None` for unknown or non-element nodes.
    fn local_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Resolved absolute `href` of an anchor.
    fn href(&self, node: NodeId) -> Option<String>;

    /// Composed parent: crosses shadow boundaries to the host.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is connected to the document.
    fn contains(&self, node: NodeId) -> bool;

    /// `node.matches(':hover')`.
    fn is_hovered(&self, node: NodeId) -> bool;

    /// `document.querySelectorAll(':hover')`, outermost first.
    fn hovered_chain(&self) -> Vec<NodeId>;

    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// First anchor whose `href` contains any of the fragments.
    fn find_link(&self, href_fragments: &[&str]) -> Option<NodeId>;

    /// All anchors whose `href` equals `href` exactly.
    fn anchors_with_href(&self, href: &str) -> Vec<NodeId>;

    fn body(&self) -> NodeId;

    fn create_element(&self, tag: &str) -> NodeId;

    /// Attach a closed shadow root to `host` and return it.
    fn attach_shadow(&self, host: NodeId) -> NodeId;

    fn append_child(&self, parent: NodeId, child: NodeId);

    fn replace_node(&self, old: NodeId, new: NodeId);

    fn remove_node(&self, node: NodeId);

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&self, node: NodeId, name: &str);

    fn set_text_content(&self, node: NodeId, text: &str);

    /// Inline style property value.
    fn style_property(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_style_property(&self, node: NodeId, name: &str, value: &str, important: bool);

    fn remove_style_property(&self, node: NodeId, name: &str);

    /// Number of inline style declarations.
    fn style_len(&self, node: NodeId) -> usize;

    fn media_play(&self, node: NodeId);

    fn media_pause(&self, node: NodeId);

    fn media_paused(&self, node: NodeId) -> bool;

    fn media_set_current_time(&self, node: NodeId, seconds: f64);

    fn media_set_volume(&self, node: NodeId, volume: f64);

    /// Drop any text selection in the document.
    fn clear_selection(&self);

    fn set_listener(&self, kind: ListenerKind, enabled: bool);

    /// Start or stop observing childList/attributes/characterData mutations
    /// of the body subtree.
    fn observe_mutations(&self, enabled: bool);
}
