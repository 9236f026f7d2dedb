//! Page-related errors.

use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A document description could not be turned into a page.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_node_error() {
        let err = PageError::UnknownNode(NodeId(42));
        assert_eq!(err.to_string(), "Unknown node: node#42");
    }

    #[test]
    fn test_invalid_document_error() {
        let err = PageError::InvalidDocument("duplicate id 3".to_string());
        assert!(err.to_string().contains("duplicate id 3"));
    }
}
