use super::*;

const HOVER_SCENARIO: &str = r#"{
    "name": "hover and dismiss",
    "preferences": {"delay": 100},
    "document": {
        "location": "https://news.example.org/",
        "body": [
            {"id": 5, "tag": "a", "attributes": {"href": "https://youtu.be/abc?t=1m"},
             "rect": {"left": 20, "top": 40, "width": 120, "height": 16}},
            {"id": 6, "tag": "p"}
        ]
    },
    "steps": [
        {"hover": {"node": 5, "x": 30, "y": 45}},
        {"wait": 101},
        {"wait": 5},
        {"click": {"node": 6, "x": 900, "y": 600}}
    ]
}"#;

#[test]
fn test_scenario_parses_every_step_form() {
    let scenario = Scenario::from_json(
        r#"{
            "document": {"location": "https://example.com/"},
            "steps": [
                {"hover": {"node": 3}},
                "unhover",
                {"down": {"x": 10, "y": 10}},
                {"key": {"key": "Escape", "code": "Escape"}},
                "media_can_play",
                {"volume": 0.4},
                {"event": {"type": "destruct_signal"}},
                {"wait": 20},
                {"set_preferences": {"dark": true}},
                "kill_runtime",
                "detach"
            ]
        }"#,
    )
    .unwrap();

    let labels: Vec<String> = scenario.steps.iter().map(Step::label).collect();
    assert_eq!(
        labels,
        vec![
            "hover node#3",
            "unhover",
            "down overlay (10, 10)",
            "key Escape",
            "media can play",
            "volume 0.4",
            "event DestructSignal",
            "wait 20ms",
            "set dark",
            "kill runtime",
            "detach",
        ]
    );
}

#[test]
fn test_scenario_requires_document() {
    assert!(Scenario::from_json(r#"{"steps": []}"#).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_replay_hover_then_dismiss() {
    let scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    let report = run(scenario, PreferenceMap::new()).await.unwrap();

    assert_eq!(report.name.as_deref(), Some("hover and dismiss"));
    assert_eq!(report.steps.len(), 4);
    assert_eq!(report.steps[0].phase, "Absent");
    assert_eq!(report.steps[2].phase, "Ready");
    assert_eq!(report.steps[3].phase, "Absent");
    assert_eq!(
        report.steps[3].disposition,
        Some(EventDisposition::pass())
    );

    assert!(report.overlay.is_none());
    assert_eq!(report.relay_calls, vec!["addToHistory"]);
    assert_eq!(report.history, vec!["https://youtu.be/abc?t=1m"]);
    assert_eq!(report.struck_links, vec![NodeId(5)]);
    assert_eq!(report.state, "Attached");
}

#[tokio::test(start_paused = true)]
async fn test_replay_reports_open_overlay() {
    let mut scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    scenario.steps.truncate(3);
    let report = run(scenario, PreferenceMap::new()).await.unwrap();

    let overlay = report.overlay.unwrap();
    assert_eq!(overlay.phase, "Ready");
    assert_eq!(overlay.surface_kind, "Frame");
    assert_eq!(
        overlay.src.as_deref(),
        Some("https://www.youtube.com/embed/abc?start=60&fs=1&autoplay=1&enablejsapi=1")
    );
}

#[tokio::test(start_paused = true)]
async fn test_base_preferences_sit_under_scenario_ones() {
    let scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    let base = load_base_preferences(Some(r#"{"delay": 5000, "strike": false}"#)).unwrap();
    let report = run(scenario, base).await.unwrap();

    // The scenario's delay wins; strike comes from the base file.
    assert_eq!(report.steps[2].phase, "Ready");
    assert!(report.struck_links.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_destruct_after_runtime_death_detaches() {
    let mut scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    scenario.steps.truncate(3);
    scenario.steps.push(Step::Event(PageEvent::DestructSignal));
    scenario.steps.push(Step::KillRuntime);
    scenario.steps.push(Step::Event(PageEvent::DestructSignal));
    let report = run(scenario, PreferenceMap::new()).await.unwrap();

    // The first signal is forged: the runtime is still alive.
    assert_eq!(report.steps[3].phase, "Ready");
    assert_eq!(report.state, "Detached");
    assert!(report.overlay.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_preferences_rejected() {
    let scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    let base = load_base_preferences(Some(r#"{"volume": 3}"#)).unwrap();
    let err = run(scenario, base).await.unwrap_err();
    assert!(err.to_string().contains("volume"));

    let scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    let base = load_base_preferences(Some(r#"{"dark": "yes"}"#)).unwrap();
    assert!(run(scenario, base).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_missing_node_fails_with_step_context() {
    let mut scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    scenario.steps = vec![Step::Hover(PointerStep {
        node: Some(NodeId(99)),
        x: 0.0,
        y: 0.0,
        button: MouseButton::Primary,
    })];
    let err = run(scenario, PreferenceMap::new()).await.unwrap_err();
    assert!(err.to_string().contains("step 1 (hover node#99)"));
}

#[tokio::test(start_paused = true)]
async fn test_overlay_targets_need_an_overlay() {
    let mut scenario = Scenario::from_json(HOVER_SCENARIO).unwrap();
    scenario.steps = vec![Step::MediaCanPlay];
    assert!(run(scenario, PreferenceMap::new()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_demo_drag_then_escape() {
    let scenario = Scenario::from_json(include_str!("../demos/hover-frame.json")).unwrap();
    let report = run(scenario, PreferenceMap::new()).await.unwrap();

    let phases: Vec<&str> = report.steps.iter().map(|s| s.phase.as_str()).collect();
    assert_eq!(
        phases,
        vec![
            "Absent", "Absent", "Ready", "Ready", "Dragging", "Dragging", "Ready", "Ready",
            "Absent",
        ]
    );
    // The click ending the drag is swallowed.
    assert_eq!(report.steps[7].disposition, Some(EventDisposition::consumed()));
    assert!(report.overlay.is_none());
    assert_eq!(report.struck_links, vec![NodeId(11)]);
    assert_eq!(report.history, vec!["https://youtu.be/dQw4w9WgXcQ?t=42"]);
}

#[tokio::test(start_paused = true)]
async fn test_demo_native_indirect() {
    let scenario = Scenario::from_json(include_str!("../demos/native-indirect.json")).unwrap();
    let report = run(scenario, PreferenceMap::new()).await.unwrap();

    let overlay = report.overlay.unwrap();
    assert_eq!(overlay.phase, "Ready");
    assert_eq!(overlay.surface_kind, "Video");
    assert_eq!(
        overlay.sources,
        vec![
            "https://cdn.example/abc/720.mp4&sig=deacbf",
            "https://cdn.example/abc/360.mp4",
        ]
    );
    assert_eq!(
        report.relay_calls,
        vec!["findId", "getVideoInfo", "addToHistory"]
    );
    assert_eq!(report.history, vec!["https://www.youtube.com/shared?ci=cid-7"]);
}
