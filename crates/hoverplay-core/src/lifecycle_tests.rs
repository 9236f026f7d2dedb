use super::*;
use std::sync::atomic::AtomicUsize;

use crate::sim::SimPage;

struct TestHook {
    order: Arc<Mutex<Vec<i32>>>,
    calls: AtomicUsize,
    priority: i32,
}

impl TestHook {
    fn new(order: &Arc<Mutex<Vec<i32>>>, priority: i32) -> Self {
        Self {
            order: order.clone(),
            calls: AtomicUsize::new(0),
            priority,
        }
    }
}

impl TeardownHook for TestHook {
    fn on_teardown(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.order.lock().push(self.priority);
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[test]
fn test_session_state_conversion() {
    assert_eq!(SessionState::from(0), SessionState::Attaching);
    assert_eq!(SessionState::from(1), SessionState::Attached);
    assert_eq!(SessionState::from(2), SessionState::TearingDown);
    assert_eq!(SessionState::from(99), SessionState::Detached);
}

#[test]
fn test_attach_then_teardown() {
    let lifecycle = Lifecycle::new();
    assert_eq!(lifecycle.state(), SessionState::Attaching);
    assert!(lifecycle.mark_attached());
    assert!(lifecycle.is_attached());

    assert!(lifecycle.begin_teardown());
    assert_eq!(lifecycle.state(), SessionState::TearingDown);

    lifecycle.finish_teardown();
    assert_eq!(lifecycle.state(), SessionState::Detached);
}

#[test]
fn test_teardown_only_once() {
    let lifecycle = Lifecycle::new();
    lifecycle.mark_attached();
    assert!(lifecycle.begin_teardown());
    lifecycle.finish_teardown();

    assert!(!lifecycle.begin_teardown());
    assert_eq!(lifecycle.state(), SessionState::Detached);
}

#[test]
fn test_cannot_attach_after_teardown() {
    let lifecycle = Lifecycle::new();
    assert!(lifecycle.begin_teardown());
    assert!(!lifecycle.mark_attached());
}

#[test]
fn test_hooks_run_in_priority_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = Lifecycle::new();
    let late = Arc::new(TestHook::new(&order, 100));
    let early = Arc::new(TestHook::new(&order, 0));
    lifecycle.register_hook(late.clone());
    lifecycle.register_hook(early.clone());

    lifecycle.begin_teardown();
    lifecycle.finish_teardown();
    lifecycle.finish_teardown();

    assert_eq!(*order.lock(), vec![0, 100]);
    assert_eq!(late.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registry_claim_release() {
    let registry = AttachRegistry::new();
    let frame = FrameKey::new(42);
    assert!(registry.claim(frame));
    assert!(!registry.claim(frame));
    assert!(registry.is_claimed(frame));

    registry.release(frame);
    assert!(!registry.is_claimed(frame));
    assert!(registry.claim(frame));
}

struct Claimant {
    registry: Arc<AttachRegistry>,
    frame: FrameKey,
    alive: bool,
    signals: AtomicUsize,
}

impl DestructTarget for Claimant {
    fn destruct_signal(&self) {
        self.signals.fetch_add(1, Ordering::SeqCst);
        if !self.alive {
            self.registry.release(self.frame);
        }
    }
}

#[test]
fn test_registry_signal_reaches_bound_claimant() {
    let registry = Arc::new(AttachRegistry::new());
    let frame = FrameKey::new(7);
    assert!(registry.claim(frame));
    // Nothing bound yet.
    assert!(!registry.signal(frame));

    let live = Arc::new(Claimant {
        registry: registry.clone(),
        frame,
        alive: true,
        signals: AtomicUsize::new(0),
    });
    let target: std::sync::Weak<dyn DestructTarget> = Arc::downgrade(&live) as std::sync::Weak<Claimant>;
    registry.bind(frame, target);
    assert!(registry.signal(frame));
    assert_eq!(live.signals.load(Ordering::SeqCst), 1);
    assert!(registry.is_claimed(frame));

    registry.release(frame);
    assert!(registry.claim(frame));
    let orphan = Arc::new(Claimant {
        registry: registry.clone(),
        frame,
        alive: false,
        signals: AtomicUsize::new(0),
    });
    let target: std::sync::Weak<dyn DestructTarget> = Arc::downgrade(&orphan) as std::sync::Weak<Claimant>;
    registry.bind(frame, target);
    assert!(registry.signal(frame));
    assert!(!registry.is_claimed(frame));

    drop(orphan);
    assert!(registry.claim(frame));
    assert!(!registry.signal(frame));
}

#[test]
fn test_frame_key_follows_page_allocation() {
    let page: Arc<dyn Page> = Arc::new(SimPage::new("https://example.com/"));
    let clone = page.clone();
    let other: Arc<dyn Page> = Arc::new(SimPage::new("https://example.com/"));

    assert_eq!(FrameKey::of(&page), FrameKey::of(&clone));
    assert_ne!(FrameKey::of(&page), FrameKey::of(&other));
    assert!(FrameKey::new(255).to_string().contains("0xff"));
}
