//! Value types shared by every hoverplay crate.

mod geometry;
mod node;

pub use geometry::*;
pub use node::*;
