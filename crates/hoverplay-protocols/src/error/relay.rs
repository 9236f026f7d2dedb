//! Relay-related errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The background context answered with an error payload.
    #[error("Relay rejected {command}: {message}")]
    Rejected { command: String, message: String },

    /// The extension context is gone; privileged calls can no longer succeed.
    #[error("Extension context invalidated")]
    ContextInvalidated,

    /// The command is not part of the relay protocol.
    #[error("Unknown relay command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for {command}: {message}")]
    InvalidArguments { command: String, message: String },

    /// The reply did not have the shape the command promises.
    #[error("Malformed reply to {command}: {message}")]
    MalformedReply { command: String, message: String },

    /// The relay answered with a response variant meant for another command.
    #[error("Unexpected response to {0}")]
    UnexpectedResponse(String),

    /// The capability behind the command was not granted.
    #[error("Permission missing: {0}")]
    PermissionMissing(String),

    #[error("Relay request timed out")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
