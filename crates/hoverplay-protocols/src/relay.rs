//! Relay protocol definitions.
//!
//! The relay is the privileged background context. The content layer talks
//! to it through a closed set of commands; anything outside this set is
//! rejected at the relay boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Commands the content layer may send to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayRequest {
    /// Resolve an indirect (shared) id to a playable video id.
    FindId(String),
    /// Fetch playable stream metadata for a video id.
    GetVideoInfo(String),
    /// Record a URL in the browser history.
    AddToHistory(String),
    /// Load the player code into the calling frame.
    InjectPlayer,
}

impl RelayRequest {
    /// Wire name of the command.
    pub fn command(&self) -> &'static str {
        match self {
            RelayRequest::FindId(_) => "findId",
            RelayRequest::GetVideoInfo(_) => "getVideoInfo",
            RelayRequest::AddToHistory(_) => "addToHistory",
            RelayRequest::InjectPlayer => "injectPlayer",
        }
    }
}

/// Replies from the relay, one variant per reply shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelayResponse {
    /// Reply to [`RelayRequest::FindId`]; `None` when nothing was found.
    VideoId(Option<String>),
    /// Reply to [`RelayRequest::GetVideoInfo`].
    VideoInfo(VideoInfo),
    /// Reply to commands without a payload.
    Done,
}

/// A playable stream the native surface can try.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub src: String,
    pub title: String,
}

/// Raw stream format metadata as published by the video host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `signatureCipher` (current name) or `cipher` (older name).
    #[serde(default, alias = "signatureCipher", skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_label: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Payload of a `getVideoInfo` reply.
///
/// Relays either hand back ready candidates or the raw format list; the
/// client normalises the latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoInfo {
    Candidates(Vec<StreamCandidate>),
    Formats(Vec<StreamFormat>),
}

/// Carries relay commands to the background context.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Send one command and wait for its reply.
    async fn call(&self, request: RelayRequest) -> Result<RelayResponse, RelayError>;
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
