//! Error types for the hoverplay protocol layer.

mod page;
mod relay;
mod store;

pub use page::*;
pub use relay::*;
pub use store::*;
