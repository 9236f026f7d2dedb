//! Session lifecycle management.
//!
//! Provides the attach/teardown lifecycle of a content session:
//! - Session state transitions (attaching, attached, tearing down, detached)
//! - A registry keyed by frame; a second attach signals the current claimant
//!   to self-destruct and only takes the frame once it has let go
//! - Teardown hooks run in priority order when the session goes away

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use hoverplay_protocols::Page;
use parking_lot::Mutex;
use tracing::{debug, info};

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Preferences are loading; no listener is registered yet.
    Attaching = 0,
    /// Listening for events.
    Attached = 1,
    /// Tearing down.
    TearingDown = 2,
    /// Gone; every event is ignored.
    Detached = 3,
}

impl From<u8> for SessionState {
    fn from(v: u8) -> Self {
        match v {
            0 => SessionState::Attaching,
            1 => SessionState::Attached,
            2 => SessionState::TearingDown,
            _ => SessionState::Detached,
        }
    }
}

/// Identity of a host frame.
///
/// A frame is identified by the allocation of its page handle: two sessions
/// built from clones of the same `Arc<dyn Page>` target the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameKey(usize);

impl FrameKey {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn of(page: &Arc<dyn Page>) -> Self {
        Self(Arc::as_ptr(page) as *const () as usize)
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame@{:#x}", self.0)
    }
}

/// Receiver of the self-destruct signal a re-injected session sends.
pub trait DestructTarget: Send + Sync {
    fn destruct_signal(&self);
}

/// Frames that currently have a session attached.
#[derive(Default)]
pub struct AttachRegistry {
    frames: Mutex<HashMap<FrameKey, Option<Weak<dyn DestructTarget>>>>,
}

impl fmt::Debug for AttachRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachRegistry")
            .field("frames", &self.frames.lock().len())
            .finish()
    }
}

impl AttachRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> Arc<AttachRegistry> {
        static GLOBAL: OnceLock<Arc<AttachRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(AttachRegistry::new())).clone()
    }

    /// Claim a frame; `false` if it is already claimed.
    pub fn claim(&self, frame: FrameKey) -> bool {
        let mut frames = self.frames.lock();
        if frames.contains_key(&frame) {
            return false;
        }
        frames.insert(frame, None);
        true
    }

    /// Record where the claimant of `frame` receives the destruct signal.
    pub fn bind(&self, frame: FrameKey, target: Weak<dyn DestructTarget>) {
        if let Some(slot) = self.frames.lock().get_mut(&frame) {
            *slot = Some(target);
        }
    }

    /// Send the destruct signal to the claimant of `frame`. Returns `false`
    /// when there is no live claimant to signal.
    pub fn signal(&self, frame: FrameKey) -> bool {
        let target = self
            .frames
            .lock()
            .get(&frame)
            .and_then(|slot| slot.as_ref())
            .and_then(Weak::upgrade);
        match target {
            Some(target) => {
                debug!("Signalling the session on {}", frame);
                target.destruct_signal();
                true
            }
            None => false,
        }
    }

    pub fn release(&self, frame: FrameKey) {
        self.frames.lock().remove(&frame);
    }

    #[cfg(test)]
    pub(crate) fn is_claimed(&self, frame: FrameKey) -> bool {
        self.frames.lock().contains_key(&frame)
    }
}

/// Hook run when a session tears down.
pub trait TeardownHook: Send + Sync {
    fn on_teardown(&self);

    /// Ordering among hooks (higher = runs later).
    fn priority(&self) -> i32 {
        0
    }
}

/// Lifecycle of one content session.
pub struct Lifecycle {
    state: AtomicU8,
    hooks: Mutex<Vec<Arc<dyn TeardownHook>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Attaching as u8),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_attached(&self) -> bool {
        self.state() == SessionState::Attached
    }

    /// Move from attaching to attached; `false` if teardown already began.
    pub fn mark_attached(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                SessionState::Attaching as u8,
                SessionState::Attached as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            debug!("Session attached");
        }
        moved
    }

    pub fn register_hook(&self, hook: Arc<dyn TeardownHook>) {
        let mut hooks = self.hooks.lock();
        hooks.push(hook);
        hooks.sort_by_key(|h| h.priority());
    }

    /// Start teardown. Returns `false` if it already started.
    pub fn begin_teardown(&self) -> bool {
        let previous = self
            .state
            .swap(SessionState::TearingDown as u8, Ordering::SeqCst);
        match SessionState::from(previous) {
            SessionState::Attaching | SessionState::Attached => {
                info!("Session tearing down...");
                true
            }
            other => {
                self.state.store(other as u8, Ordering::SeqCst);
                false
            }
        }
    }

    /// Run the teardown hooks and mark the session detached.
    pub fn finish_teardown(&self) {
        let hooks: Vec<_> = self.hooks.lock().drain(..).collect();
        for hook in hooks {
            hook.on_teardown();
        }
        self.state
            .store(SessionState::Detached as u8, Ordering::SeqCst);
        info!("Session detached");
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
