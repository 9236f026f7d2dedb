//! Preference schema definitions.
//!
//! Field names on the wire are the persisted storage keys, which is why
//! several of them are kebab- or camel-cased.

use std::time::Duration;

use hoverplay_protocols::{ChangeSet, PreferenceMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Smallest width a resize can produce.
pub const MIN_OVERLAY_WIDTH: f64 = 200.0;

/// Where the overlay is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlacementMode {
    /// Below the hovered link, page-relative (`mode` = 0).
    #[default]
    Anchored,
    /// Centered in the window, fixed (`mode` = 1).
    Centered,
}

impl TryFrom<u8> for PlacementMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlacementMode::Anchored),
            1 => Ok(PlacementMode::Centered),
            other => Err(format!("unknown placement mode {}", other)),
        }
    }
}

impl From<PlacementMode> for u8 {
    fn from(mode: PlacementMode) -> Self {
        match mode {
            PlacementMode::Anchored => 0,
            PlacementMode::Centered => 1,
        }
    }
}

/// User preferences, read by every engine component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Overlay width in pixels; height follows from 16:9.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Hover delay in milliseconds.
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Pointer travel (px) tolerated while the delay runs.
    #[serde(rename = "maxMovement", default = "default_max_movement")]
    pub max_movement: f64,

    #[serde(default)]
    pub mode: PlacementMode,

    /// Strike through links whose video was opened.
    #[serde(default = "default_true")]
    pub strike: bool,

    /// Record opened links in the browser history.
    #[serde(default = "default_true")]
    pub history: bool,

    /// Scroll the overlay into view when placed off-screen.
    #[serde(default = "default_true")]
    pub scroll: bool,

    #[serde(default = "default_true")]
    pub smooth: bool,

    /// Darken the page around the overlay.
    #[serde(default)]
    pub dark: bool,

    /// Play raw streams in a native video element instead of the embed frame.
    #[serde(default)]
    pub native: bool,

    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(rename = "relative-x", default)]
    pub relative_x: f64,

    #[serde(rename = "relative-y", default)]
    pub relative_y: f64,

    #[serde(rename = "center-x", default)]
    pub center_x: f64,

    #[serde(rename = "center-y", default)]
    pub center_y: f64,

    #[serde(default)]
    pub hotkey: String,

    #[serde(rename = "hotkeyOn", default)]
    pub hotkey_on: bool,

    /// Enable hover players on the video-hosting site itself.
    #[serde(default)]
    pub youtube: bool,

    /// Keys this version does not know about, kept as-is.
    #[serde(flatten)]
    pub extra: PreferenceMap,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            width: default_width(),
            delay: default_delay(),
            max_movement: default_max_movement(),
            mode: PlacementMode::default(),
            strike: true,
            history: true,
            scroll: true,
            smooth: true,
            dark: false,
            native: false,
            volume: default_volume(),
            relative_x: 0.0,
            relative_y: 0.0,
            center_x: 0.0,
            center_y: 0.0,
            hotkey: String::new(),
            hotkey_on: false,
            youtube: false,
            extra: PreferenceMap::new(),
        }
    }
}

fn default_width() -> f64 {
    500.0
}

fn default_delay() -> f64 {
    1000.0
}

fn default_max_movement() -> f64 {
    10.0
}

fn default_volume() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

/// Outcome of applying a batch of values or changes.
#[derive(Debug, Default)]
pub struct AppliedChanges {
    /// Keys whose value was taken over.
    pub applied: Vec<String>,
    /// Keys whose value was refused; the previous value stays.
    pub rejected: Vec<ConfigError>,
}

impl AppliedChanges {
    pub fn contains(&self, key: &str) -> bool {
        self.applied.iter().any(|k| k == key)
    }
}

impl Preferences {
    /// Hover delay as a duration; negative values clamp to zero.
    pub fn delay_duration(&self) -> Duration {
        Duration::from_millis(self.delay.max(0.0).round() as u64)
    }

    /// The hotkey chord, when hotkey mode is on and a chord is configured.
    pub fn hotkey_chord(&self) -> Option<&str> {
        if self.hotkey_on && !self.hotkey.is_empty() {
            Some(self.hotkey.as_str())
        } else {
            None
        }
    }

    /// Serialize into the flat persisted mapping.
    pub fn to_map(&self) -> Result<PreferenceMap, ConfigError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(ConfigError::InvalidFormat(format!(
                "preferences serialized to {}",
                other
            ))),
        }
    }

    /// Set one key, validating its type against the schema.
    pub fn set_value(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut map = self.to_map()?;
        map.insert(key.to_string(), value);
        let next: Preferences =
            serde_json::from_value(Value::Object(map)).map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                message: e.to_string(),
            })?;
        *self = next;
        Ok(())
    }

    /// Reset one key to its default; unknown keys are dropped.
    pub fn reset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        let defaults = Preferences::default().to_map()?;
        match defaults.get(key) {
            Some(value) => self.set_value(key, value.clone()),
            None => {
                self.extra.remove(key);
                Ok(())
            }
        }
    }

    /// Merge persisted values over the current ones, key by key.
    pub fn merge_values(&mut self, values: &PreferenceMap) -> AppliedChanges {
        let mut outcome = AppliedChanges::default();
        for (key, value) in values {
            match self.set_value(key, value.clone()) {
                Ok(()) => outcome.applied.push(key.clone()),
                Err(e) => outcome.rejected.push(e),
            }
        }
        outcome
    }

    /// Apply a change notification in place: only the changed keys.
    pub fn apply_changes(&mut self, changes: &ChangeSet) -> AppliedChanges {
        let mut outcome = AppliedChanges::default();
        for (key, change) in changes {
            let result = match &change.new_value {
                Some(value) => self.set_value(key, value.clone()),
                None => self.reset_value(key),
            };
            match result {
                Ok(()) => outcome.applied.push(key.clone()),
                Err(e) => outcome.rejected.push(e),
            }
        }
        outcome
    }
}
