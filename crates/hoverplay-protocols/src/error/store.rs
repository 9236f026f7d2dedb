//! Preference store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preference storage unavailable: {0}")]
    Unavailable(String),

    #[error("Preference write failed: {0}")]
    WriteFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("context gone".to_string());
        assert!(err.to_string().contains("context gone"));

        let err = StoreError::WriteFailed("quota".to_string());
        assert!(err.to_string().contains("quota"));
    }
}
