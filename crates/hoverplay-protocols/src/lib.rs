//! # hoverplay Protocols
//!
//! Protocol definitions (traits and wire types) for the hoverplay overlay
//! engine. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`Page`] - The host document: tree queries, mutations, listeners
//! - [`RelayTransport`] - Command channel to the privileged background context
//! - [`PreferenceStore`] - Persisted preferences and their change stream
//! - [`ExtensionRuntime`] - Liveness probe of the extension context

pub mod error;
pub mod event;
pub mod page;
pub mod relay;
pub mod runtime;
pub mod store;
pub mod types;

pub use error::{PageError, RelayError, StoreError};
pub use event::{EventDisposition, KeyEvent, MouseButton, PageEvent, PointerEvent};
pub use page::{ListenerKind, Page};
pub use relay::{
    RelayRequest, RelayResponse, RelayTransport, StreamCandidate, StreamFormat, VideoInfo,
};
pub use runtime::ExtensionRuntime;
pub use store::{ChangeSet, PreferenceMap, PreferenceStore, StorageChange};
pub use types::*;
