use super::*;

fn keys(issues: &[PreferenceIssue], severity: Severity) -> Vec<&'static str> {
    issues
        .iter()
        .filter(|issue| issue.severity == severity)
        .map(|issue| issue.key)
        .collect()
}

#[test]
fn test_default_preferences_are_clean() {
    assert!(PreferenceValidator::validate(&Preferences::default()).is_empty());
    assert!(PreferenceValidator::check(&Preferences::default()).unwrap().is_empty());
}

#[test]
fn test_width_bounds() {
    let zero = Preferences {
        width: 0.0,
        ..Default::default()
    };
    assert_eq!(keys(&PreferenceValidator::validate(&zero), Severity::Error), ["width"]);

    let narrow = Preferences {
        width: 120.0,
        ..Default::default()
    };
    let warnings = PreferenceValidator::check(&narrow).unwrap();
    assert_eq!(keys(&warnings, Severity::Warning), ["width"]);
}

#[test]
fn test_negative_timing() {
    let prefs = Preferences {
        delay: -1.0,
        max_movement: -5.0,
        ..Default::default()
    };
    assert_eq!(
        keys(&PreferenceValidator::validate(&prefs), Severity::Error),
        ["delay", "maxMovement"]
    );
}

#[test]
fn test_volume_range() {
    let loud = Preferences {
        volume: 1.5,
        ..Default::default()
    };
    let err = PreferenceValidator::check(&loud).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "volume"));

    let muted = Preferences {
        volume: 0.0,
        ..Default::default()
    };
    assert!(PreferenceValidator::check(&muted).is_ok());
}

#[test]
fn test_non_finite_offset() {
    let prefs = Preferences {
        center_y: f64::NAN,
        ..Default::default()
    };
    assert_eq!(
        keys(&PreferenceValidator::validate(&prefs), Severity::Error),
        ["center-y"]
    );
}

#[test]
fn test_hotkey_on_without_hotkey_warns() {
    let prefs = Preferences {
        hotkey_on: true,
        ..Default::default()
    };
    let warnings = PreferenceValidator::check(&prefs).unwrap();
    assert_eq!(keys(&warnings, Severity::Warning), ["hotkey"]);
}

#[test]
fn test_check_reports_first_error() {
    let prefs = Preferences {
        width: -10.0,
        delay: -1.0,
        volume: 2.0,
        ..Default::default()
    };
    assert_eq!(PreferenceValidator::validate(&prefs).len(), 3);
    let err = PreferenceValidator::check(&prefs).unwrap_err();
    assert!(err.to_string().contains("width"));
}
