//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Preferences file not found: {0}")]
    NotFound(String),

    #[error("Invalid preferences format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound("prefs.json".to_string());
        assert!(err.to_string().contains("prefs.json"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_format_error() {
        let err = ConfigError::InvalidFormat("expected object".to_string());
        assert!(err.to_string().contains("expected object"));
        assert!(err.to_string().contains("Invalid"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::InvalidValue {
            field: "width".to_string(),
            message: "must be positive".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("width"));
        assert!(display.contains("must be positive"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
        let err = ConfigError::from(json_err);
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn test_error_debug() {
        let err = ConfigError::NotFound("test.json".to_string());
        let debug = format!("{:?}", err);
        assert!(debug.contains("NotFound"));
    }
}
