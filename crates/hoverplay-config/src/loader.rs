//! Preference loader.

use std::fs;
use std::path::Path;

use hoverplay_protocols::PreferenceMap;
use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::Preferences;

/// Loads persisted preferences and merges them over the defaults.
pub struct PreferenceLoader;

impl PreferenceLoader {
    /// Load preferences from a JSON file holding the flat persisted mapping.
    pub fn load(path: &Path) -> Result<Preferences, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load preferences from a JSON string. Every key must be valid.
    pub fn load_str(content: &str) -> Result<Preferences, ConfigError> {
        let map = Self::parse_map(content)?;
        let mut prefs = Preferences::default();
        let outcome = prefs.merge_values(&map);
        match outcome.rejected.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(prefs),
        }
    }

    /// Merge a persisted mapping over the defaults, skipping invalid keys.
    pub fn merge_over_defaults(values: &PreferenceMap) -> Preferences {
        let mut prefs = Preferences::default();
        let outcome = prefs.merge_values(values);
        for err in outcome.rejected {
            tracing::warn!("Ignoring persisted preference: {}", err);
        }
        prefs
    }

    /// Parse a JSON document into a flat mapping. An empty document is an
    /// empty mapping.
    pub fn parse_map(content: &str) -> Result<PreferenceMap, ConfigError> {
        if content.trim().is_empty() {
            return Ok(PreferenceMap::new());
        }
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => Ok(map),
            other => Err(ConfigError::InvalidFormat(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
