use super::*;
use crate::sim::SimPage;

struct Fixture {
    page: SimPage,
    prefs: Preferences,
    listeners: ListenerSet,
    detector: HoverIntentDetector,
    link: NodeId,
    span: NodeId,
}

impl Fixture {
    fn new(location: &str, href: &str, prefs: Preferences) -> Self {
        let page = SimPage::new(location);
        let link = page.add_element(page.body(), "a", &[("href", href)]);
        let span = page.add_element(link, "span", &[]);
        let mut listeners = ListenerSet::new();
        let mut detector = HoverIntentDetector::new(&page);
        detector.rebind(&page, &prefs, &mut listeners);
        Self {
            page,
            prefs,
            listeners,
            detector,
            link,
            span,
        }
    }

    fn offsite() -> Self {
        Self::new(
            "https://example.com/",
            "https://youtu.be/abc?t=5",
            Preferences::default(),
        )
    }

    fn event(&self, target: NodeId, x: f64, y: f64) -> PointerEvent {
        self.page.pointer_event(target, x, y)
    }

    fn over_event(&mut self, event: &PointerEvent, overlay_exists: bool) -> HoverStep {
        self.page.hover(event.path.first().copied().unwrap_or(event.target));
        self.detector.on_pointer_over(
            &self.page,
            &self.prefs,
            &mut self.listeners,
            event,
            overlay_exists,
        )
    }

    fn over(&mut self, target: NodeId, x: f64, y: f64) -> HoverStep {
        let event = self.event(target, x, y);
        self.over_event(&event, false)
    }

    fn move_to(&mut self, target: NodeId, x: f64, y: f64) -> HoverStep {
        let event = self.event(target, x, y);
        self.detector
            .on_pointer_move(&self.page, &mut self.listeners, &event)
    }

    fn fire(&mut self) -> Option<HoverAction> {
        self.detector
            .on_timer(&self.page, &self.prefs, &mut self.listeners)
    }

    fn key(&mut self, event: &KeyEvent) -> HoverStep {
        self.detector
            .on_key(&self.page, &self.prefs, &mut self.listeners, event, false)
    }
}

fn hotkey_prefs(chord: &str) -> Preferences {
    Preferences {
        hotkey_on: true,
        hotkey: chord.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_pointer_over_link_arms_timer() {
    let mut f = Fixture::offsite();
    assert!(f.page.listener_enabled(ListenerKind::PointerOver));

    let step = f.over(f.span, 10.0, 10.0);
    assert_eq!(step.action, Some(HoverAction::Arm(Duration::from_millis(1000))));
    assert_eq!(step.disposition, EventDisposition::claimed());
    assert!(!step.cancel_timer);
    assert!(f.detector.is_pending());
    assert!(f.page.listener_enabled(ListenerKind::PointerMove));
    assert!(f.page.listener_enabled(ListenerKind::PointerDown));
}

#[test]
fn test_pointer_over_plain_element_does_nothing() {
    let mut f = Fixture::offsite();
    let div = f.page.add_element(f.page.body(), "div", &[]);
    let step = f.over(div, 10.0, 10.0);
    assert_eq!(step, HoverStep::default());
    assert!(!f.detector.is_suspended());
}

#[test]
fn test_same_point_is_ignored() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);

    let step = f.over(f.link, 10.0, 10.0);
    assert!(step.cancel_timer);
    assert_eq!(step.action, None);
    assert!(!f.detector.is_pending());
}

#[test]
fn test_bad_bubble_path_skips_reclassification() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);

    // The anchor is an ancestor of the last classified target.
    let step = f.over(f.link, 11.0, 10.0);
    assert!(step.cancel_timer);
    assert_eq!(step.action, None);

    // The path was popped up to the anchor; the span classifies again.
    let step = f.over(f.span, 12.0, 10.0);
    assert!(matches!(step.action, Some(HoverAction::Arm(_))));
}

#[test]
fn test_existing_overlay_blocks_intent() {
    let mut f = Fixture::offsite();
    let event = f.event(f.span, 10.0, 10.0);
    let step = f.over_event(&event, true);
    assert_eq!(step.action, None);
    assert!(!f.detector.is_pending());
}

#[test]
fn test_shift_held_is_rejected() {
    let mut f = Fixture::offsite();
    let mut event = f.event(f.span, 10.0, 10.0);
    event.shift_key = true;
    let step = f.over_event(&event, false);
    assert_eq!(step.action, None);
}

#[test]
fn test_drift_rearms_instead_of_cancelling() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.move_to(f.span, 25.0, 10.0);
    assert_eq!(f.detector.distance(), 15.0);

    assert_eq!(f.fire(), Some(HoverAction::Arm(Duration::from_millis(1000))));
    assert_eq!(f.detector.distance(), 0.0);
    assert!(f.detector.is_pending());

    match f.fire() {
        Some(HoverAction::Confirm(link)) => {
            assert_eq!(link.video_id, "abc");
            assert_eq!(link.start_seconds, 5);
            assert_eq!(link.anchor, f.link);
        }
        other => panic!("expected confirmation, got {:?}", other),
    }
    assert!(!f.detector.is_pending());
    assert!(!f.page.listener_enabled(ListenerKind::PointerMove));
    assert!(!f.page.listener_enabled(ListenerKind::PointerDown));
}

#[test]
fn test_small_drift_confirms() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.move_to(f.span, 16.0, 18.0);
    assert_eq!(f.detector.distance(), 10.0);
    assert!(matches!(f.fire(), Some(HoverAction::Confirm(_))));
}

#[test]
fn test_timer_drops_when_focus_changed() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.page.set_focus(false);
    assert_eq!(f.fire(), None);
    assert!(!f.detector.is_pending());
}

#[test]
fn test_timer_drops_when_pointer_left() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.page.unhover();
    assert_eq!(f.fire(), None);
}

#[test]
fn test_timer_drops_after_navigation() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.page.set_location("https://example.com/next");
    assert_eq!(f.fire(), None);
}

#[test]
fn test_timer_without_intent() {
    let mut f = Fixture::offsite();
    assert_eq!(f.fire(), None);
}

#[test]
fn test_pointer_down_cancels_intent() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    let event = f.event(f.page.body(), 50.0, 50.0);
    let outcome = f
        .detector
        .on_click(&f.page, &mut f.listeners, &event, None);
    assert!(outcome.cancel_timer);
    assert!(!outcome.dismiss);
    assert!(!f.detector.is_pending());
    assert!(!f.page.listener_enabled(ListenerKind::PointerMove));
}

#[test]
fn test_click_dismiss_rules() {
    let mut f = Fixture::offsite();
    let root = f.page.add_element(f.page.body(), "div", &[]);

    let outside = f.event(f.page.body(), 1.0, 1.0);
    let outcome = f
        .detector
        .on_click(&f.page, &mut f.listeners, &outside, Some(root));
    assert!(outcome.dismiss);

    let mut right = outside.clone();
    right.button = MouseButton::Secondary;
    let outcome = f
        .detector
        .on_click(&f.page, &mut f.listeners, &right, Some(root));
    assert!(!outcome.dismiss);

    let on_root = f.event(root, 1.0, 1.0);
    let outcome = f
        .detector
        .on_click(&f.page, &mut f.listeners, &on_root, Some(root));
    assert!(!outcome.dismiss);
}

#[test]
fn test_hotkey_mode_switches_listener() {
    let mut f = Fixture::offsite();
    assert_eq!(f.detector.bound(), Some(ListenerKind::PointerOver));

    let prefs = hotkey_prefs("Ctrl-q");
    f.detector.rebind(&f.page, &prefs, &mut f.listeners);
    assert_eq!(f.detector.bound(), Some(ListenerKind::HotkeyDown));
    assert!(f.page.listener_enabled(ListenerKind::HotkeyDown));
    assert!(!f.page.listener_enabled(ListenerKind::PointerOver));

    // Same preferences: nothing changes.
    assert!(!f.detector.rebind(&f.page, &prefs, &mut f.listeners));
    assert!(f.page.listener_enabled(ListenerKind::HotkeyDown));
}

#[test]
fn test_hotkey_confirms_immediately() {
    let mut f = Fixture::new(
        "https://example.com/",
        "https://www.youtube.com/watch?v=hk1",
        hotkey_prefs("Ctrl-q"),
    );
    f.page.hover(f.span);

    let press = KeyEvent {
        ctrl_key: true,
        ..KeyEvent::new("q", "KeyQ")
    };
    let step = f.key(&press);
    assert_eq!(step.disposition, EventDisposition::consumed());
    match step.action {
        Some(HoverAction::Confirm(link)) => assert_eq!(link.video_id, "hk1"),
        other => panic!("expected confirmation, got {:?}", other),
    }

    let repeat = KeyEvent {
        repeat: true,
        ..press.clone()
    };
    assert_eq!(f.key(&repeat).action, None);

    let other = KeyEvent::new("w", "KeyW");
    let step = f.key(&other);
    assert_eq!(step.action, None);
    assert_eq!(step.disposition, EventDisposition::pass());
}

#[test]
fn test_hotkey_without_hovered_link() {
    let mut f = Fixture::new(
        "https://example.com/",
        "https://youtu.be/abc",
        hotkey_prefs("Alt-x"),
    );
    f.page.hover(f.page.body());
    let press = KeyEvent {
        alt_key: true,
        ..KeyEvent::new("x", "KeyX")
    };
    let step = f.key(&press);
    assert!(step.disposition.prevent_default);
    assert!(!step.disposition.stop_propagation);
    assert_eq!(step.action, None);
}

#[test]
fn test_shift_hotkey_is_allowed() {
    let mut f = Fixture::new(
        "https://example.com/",
        "https://youtu.be/abc",
        hotkey_prefs("Shift"),
    );
    f.page.hover(f.span);
    let press = KeyEvent {
        shift_key: true,
        ..KeyEvent::new("Shift", "ShiftLeft")
    };
    assert!(matches!(f.key(&press).action, Some(HoverAction::Confirm(_))));
}

#[test]
fn test_suspends_until_mutation_without_links() {
    let page = SimPage::new("https://example.com/");
    let div = page.add_element(page.body(), "div", &[]);
    let prefs = Preferences::default();
    let mut listeners = ListenerSet::new();
    let mut detector = HoverIntentDetector::new(&page);
    detector.rebind(&page, &prefs, &mut listeners);

    let event = page.pointer_event(div, 3.0, 4.0);
    detector.on_pointer_over(&page, &prefs, &mut listeners, &event, false);
    assert!(detector.is_suspended());
    assert!(page.is_observing());
    assert!(!page.listener_enabled(ListenerKind::PointerOver));

    detector.on_mutation(&page, &mut listeners);
    assert!(!detector.is_suspended());
    assert!(!page.is_observing());
    assert!(page.listener_enabled(ListenerKind::PointerOver));
}

#[test]
fn test_video_host_requires_opt_in_and_top_frame() {
    let page = SimPage::new("https://www.youtube.com/");
    let mut prefs = Preferences::default();
    let mut listeners = ListenerSet::new();
    let mut detector = HoverIntentDetector::new(&page);
    assert!(detector.on_video_host());

    detector.rebind(&page, &prefs, &mut listeners);
    assert_eq!(detector.bound(), None);
    assert!(!page.listener_enabled(ListenerKind::PointerOver));

    prefs.youtube = true;
    detector.rebind(&page, &prefs, &mut listeners);
    assert!(page.listener_enabled(ListenerKind::PointerOver));

    page.set_top_frame(false);
    detector.rebind(&page, &prefs, &mut listeners);
    assert_eq!(detector.bound(), None);
    assert!(!page.listener_enabled(ListenerKind::PointerOver));
}

#[test]
fn test_thumbnail_toolbar_aborts_intent() {
    let prefs = Preferences {
        youtube: true,
        ..Default::default()
    };
    let mut f = Fixture::new("https://www.youtube.com/", "/watch?v=t1", prefs);
    let toolbar = f.page.add_element(f.link, "div", &[("overlay-style", "DEFAULT")]);
    let icon = f.page.add_element(toolbar, "span", &[]);

    let step = f.over(f.link, 10.0, 10.0);
    assert!(matches!(step.action, Some(HoverAction::Arm(_))));

    let step = f.move_to(icon, 12.0, 10.0);
    assert!(step.cancel_timer);
    assert!(!f.detector.is_pending());
}

#[test]
fn test_detach_releases_listener() {
    let mut f = Fixture::offsite();
    f.over(f.span, 10.0, 10.0);
    f.detector.detach(&f.page, &mut f.listeners);
    assert_eq!(f.detector.bound(), None);
    assert!(!f.detector.is_pending());
    assert!(!f.page.listener_enabled(ListenerKind::PointerOver));
    assert!(!f.page.listener_enabled(ListenerKind::PointerMove));
}
