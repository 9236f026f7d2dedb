//! Extension runtime probe.

/// The privileged extension context the content layer was injected by.
pub trait ExtensionRuntime: Send + Sync {
    /// Extension id; doubles as the name of the reinjection event.
    fn extension_id(&self) -> String;

    /// Probe a privileged API. `false` once the extension was reloaded or
    /// removed and this content layer is orphaned.
    fn is_context_alive(&self) -> bool;
}
