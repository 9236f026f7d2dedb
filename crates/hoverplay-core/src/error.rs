//! Session errors.

use hoverplay_config::ConfigError;
use hoverplay_protocols::{PageError, RelayError, StoreError};
use thiserror::Error;

use crate::lifecycle::FrameKey;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already attached to this frame.
    #[error("Already attached to frame {0}")]
    AlreadyAttached(FrameKey),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_attached_display() {
        let err = SessionError::AlreadyAttached(FrameKey::new(7));
        assert!(err.to_string().contains("Already attached"));
    }

    #[test]
    fn test_from_store_error() {
        let err: SessionError = StoreError::Unavailable("gone".to_string()).into();
        assert!(matches!(err, SessionError::Store(_)));
    }

    #[test]
    fn test_from_relay_error() {
        let err: SessionError = RelayError::ContextInvalidated.into();
        assert!(err.to_string().contains("invalidated"));
    }
}
