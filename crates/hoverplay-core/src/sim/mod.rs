//! In-memory host for tests and scripted replays.
//!
//! [`SimPage`] implements [`Page`](hoverplay_protocols::Page) over a small
//! node tree with just enough browser behaviour for the engine: composed
//! parents across closed shadow roots, relative `href` resolution, inline
//! styles, `:hover` chains, listener and observer bookkeeping. It never
//! dispatches events itself; callers build them with
//! [`SimPage::pointer_event`] and feed them to the session.

mod document;
mod page;
mod runtime;

pub use document::{DocumentSpec, ElementSpec};
pub use page::{MediaState, SimPage};
pub use runtime::SimRuntime;
