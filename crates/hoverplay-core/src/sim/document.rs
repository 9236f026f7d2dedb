//! Serializable description of a simulated document.

use hoverplay_protocols::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A whole document: window state plus the body's children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub location: String,
    #[serde(default = "default_true")]
    pub top_frame: bool,
    #[serde(default = "default_true")]
    pub focus: bool,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

/// One element and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Fixed node id so scenarios can refer to the element. Must be unique
    /// and greater than 1 (the body).
    #[serde(default)]
    pub id: Option<u64>,
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

fn default_true() -> bool {
    true
}
