use std::sync::atomic::{AtomicBool, Ordering};

use hoverplay_protocols::ExtensionRuntime;

/// An extension runtime whose context can be killed on demand.
#[derive(Debug)]
pub struct SimRuntime {
    id: String,
    alive: AtomicBool,
}

impl SimRuntime {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alive: AtomicBool::new(true),
        }
    }

    /// Orphan the content layer, as an extension reload would.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl ExtensionRuntime for SimRuntime {
    fn extension_id(&self) -> String {
        self.id.clone()
    }

    fn is_context_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}
