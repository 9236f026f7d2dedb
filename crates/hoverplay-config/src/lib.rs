//! # hoverplay Config
//!
//! User preferences for the hoverplay overlay engine: schema and defaults,
//! loading, in-place change application, validation, and an in-memory
//! [`PreferenceStore`](hoverplay_protocols::PreferenceStore).

mod error;
mod loader;
mod schema;
mod store;
mod validator;

pub use error::ConfigError;
pub use loader::PreferenceLoader;
pub use schema::*;
pub use store::MemoryPreferenceStore;
pub use validator::{PreferenceIssue, PreferenceValidator, Severity};
