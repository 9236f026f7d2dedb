//! Opaque handles to nodes owned by the host page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a DOM node living in the host page.
///
/// The engine never owns nodes directly; it holds handles and asks the
/// [`Page`](crate::Page) to operate on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
