//! Host listener registrations.

use std::collections::HashSet;

use hoverplay_protocols::{ListenerKind, Page};
use tracing::debug;

/// Which listeners the engine currently has registered on the host.
///
/// The host is only told about actual changes. Events for listeners not in
/// the set are ignored by the session.
#[derive(Debug, Default)]
pub struct ListenerSet {
    enabled: HashSet<ListenerKind>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, page: &dyn Page, kind: ListenerKind, on: bool) {
        let changed = if on {
            self.enabled.insert(kind)
        } else {
            self.enabled.remove(&kind)
        };
        if changed {
            debug!("Listener {:?} {}", kind, if on { "on" } else { "off" });
            page.set_listener(kind, on);
        }
    }

    pub fn enable(&mut self, page: &dyn Page, kind: ListenerKind) {
        self.set(page, kind, true);
    }

    pub fn disable(&mut self, page: &dyn Page, kind: ListenerKind) {
        self.set(page, kind, false);
    }

    pub fn is_enabled(&self, kind: ListenerKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn disable_all(&mut self, page: &dyn Page) {
        for kind in self.enabled.drain() {
            page.set_listener(kind, false);
        }
    }
}
