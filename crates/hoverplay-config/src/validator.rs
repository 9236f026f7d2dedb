//! Preference validation.

use crate::error::ConfigError;
use crate::schema::{MIN_OVERLAY_WIDTH, Preferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The engine cannot run with this value.
    Error,
    /// Accepted, but probably not what the user meant.
    Warning,
}

/// A problem with one preference, keyed by its storage name.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceIssue {
    pub key: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl PreferenceIssue {
    fn error(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            key,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            key,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Preference validator.
pub struct PreferenceValidator;

impl PreferenceValidator {
    /// Every issue with `prefs`, errors and warnings in key order.
    pub fn validate(prefs: &Preferences) -> Vec<PreferenceIssue> {
        let mut issues = Vec::new();

        if !prefs.width.is_finite() || prefs.width <= 0.0 {
            issues.push(PreferenceIssue::error("width", "width must be greater than 0"));
        } else if prefs.width < MIN_OVERLAY_WIDTH {
            issues.push(PreferenceIssue::warning(
                "width",
                format!(
                    "width is below the resize minimum of {}px; the first resize will snap it",
                    MIN_OVERLAY_WIDTH
                ),
            ));
        }
        for (key, value) in [
            ("relative-x", prefs.relative_x),
            ("relative-y", prefs.relative_y),
            ("center-x", prefs.center_x),
            ("center-y", prefs.center_y),
        ] {
            if !value.is_finite() {
                issues.push(PreferenceIssue::error(key, "offset must be a finite number"));
            }
        }

        if !prefs.delay.is_finite() || prefs.delay < 0.0 {
            issues.push(PreferenceIssue::error("delay", "delay cannot be negative"));
        }
        if !prefs.max_movement.is_finite() || prefs.max_movement < 0.0 {
            issues.push(PreferenceIssue::error(
                "maxMovement",
                "maxMovement cannot be negative",
            ));
        }

        if !(0.0..=1.0).contains(&prefs.volume) {
            issues.push(PreferenceIssue::error("volume", "volume must be between 0 and 1"));
        }

        if prefs.hotkey_on && prefs.hotkey.is_empty() {
            issues.push(PreferenceIssue::warning(
                "hotkey",
                "hotkeyOn is set but no hotkey is configured; hover mode stays active",
            ));
        }

        issues
    }

    /// Fail on the first error, otherwise return the warnings.
    pub fn check(prefs: &Preferences) -> Result<Vec<PreferenceIssue>, ConfigError> {
        let (errors, warnings): (Vec<_>, Vec<_>) = Self::validate(prefs)
            .into_iter()
            .partition(PreferenceIssue::is_error);
        match errors.into_iter().next() {
            Some(issue) => Err(ConfigError::InvalidValue {
                field: issue.key.to_string(),
                message: issue.message,
            }),
            None => Ok(warnings),
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
