//! # hoverplay Core
//!
//! The overlay engine: hover a video link, get an inline player.
//!
//! ## Components
//!
//! - [`ContentSession`] - One engine attached to one frame; routes page events
//! - [`HoverIntentDetector`] - Decides when a hover means "play this"
//! - [`OverlayController`] - The floating player: DOM, styles, drag and resize
//! - [`link`] - Video link classification and embed URLs
//! - [`geometry`] - Placement, reveal scroll and resize math
//! - [`PreferenceBinding`] - Live preferences shared by every component
//! - [`Lifecycle`] / [`AttachRegistry`] - Attach once per frame, tear down once
//! - [`sim`] - An in-memory page and runtime for tests and replay

pub mod error;
pub mod geometry;
pub mod hover;
pub mod lifecycle;
pub mod link;
pub mod listeners;
pub mod overlay;
pub mod preferences;
pub mod session;
pub mod sim;
pub mod styles;
pub mod timer;

pub use error::SessionError;
pub use hover::{HoverAction, HoverIntentDetector, HoverStep};
pub use lifecycle::{
    AttachRegistry, DestructTarget, FrameKey, Lifecycle, SessionState, TeardownHook,
};
pub use link::{LinkInfo, classify_url, embed_url, parse_start_time};
pub use overlay::{OverlayController, OverlayId, OverlayPhase, SurfaceKind};
pub use preferences::{PreferenceBinding, SharedPreferences};
pub use session::{ContentSession, SessionParts};
