use super::*;

fn key(key: &str) -> KeyEvent {
    KeyEvent::new(key, "")
}

#[test]
fn test_chord_plain_key() {
    assert_eq!(key("q").chord(), "q");
}

#[test]
fn test_chord_with_modifiers() {
    let event = KeyEvent {
        ctrl_key: true,
        shift_key: true,
        ..key("Q")
    };
    assert_eq!(event.chord(), "Ctrl-Shift-Q");
}

#[test]
fn test_chord_bare_modifier() {
    let event = KeyEvent {
        ctrl_key: true,
        ..key("Control")
    };
    assert_eq!(event.chord(), "Ctrl");

    let event = KeyEvent {
        ctrl_key: true,
        shift_key: true,
        ..key("Shift")
    };
    assert_eq!(event.chord(), "Ctrl-Shift");
}

#[test]
fn test_page_event_deserialize() {
    let json = r#"{
        "type": "pointer_over",
        "target": 7,
        "path": [7, 3, 1],
        "page_x": 10.0,
        "page_y": 20.0,
        "client_x": 10.0,
        "client_y": 20.0
    }"#;
    let event: PageEvent = serde_json::from_str(json).unwrap();
    match event {
        PageEvent::PointerOver(pointer) => {
            assert_eq!(pointer.target, NodeId(7));
            assert_eq!(pointer.path.len(), 3);
            assert_eq!(pointer.button, MouseButton::Primary);
            assert!(!pointer.shift_key);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_unit_event_deserialize() {
    let event: PageEvent = serde_json::from_str(r#"{"type": "destruct_signal"}"#).unwrap();
    assert_eq!(event, PageEvent::DestructSignal);
}
