//! Background-side dispatch boundary.
//!
//! Every message from a content layer passes [`RelayDispatcher::handle`]
//! before any privileged work runs: unknown commands, wrong arity and
//! wrongly typed arguments are answered with an error reply.

use std::sync::Arc;

use async_trait::async_trait;
use hoverplay_protocols::{RelayError, RelayRequest, RelayResponse, VideoInfo};
use serde_json::Value;
use tracing::{debug, warn};

use crate::wire::{MessagePort, WireReply, WireRequest};

/// The privileged work behind each relay command.
#[async_trait]
pub trait RelayHandler: Send + Sync {
    /// Resolve an indirect id. `Ok(None)` when the lookup found nothing.
    async fn find_id(&self, indirect_id: &str) -> Result<Option<String>, RelayError>;

    async fn get_video_info(&self, video_id: &str) -> Result<VideoInfo, RelayError>;

    /// Fails with [`RelayError::PermissionMissing`] when the history
    /// capability was not granted.
    async fn add_to_history(&self, url: &str) -> Result<(), RelayError>;

    async fn inject_player(&self) -> Result<(), RelayError>;
}

/// Validates wire requests and routes them to a [`RelayHandler`].
pub struct RelayDispatcher {
    handler: Arc<dyn RelayHandler>,
}

impl RelayDispatcher {
    pub fn new(handler: Arc<dyn RelayHandler>) -> Self {
        Self { handler }
    }

    /// Handle one raw message and produce its reply.
    pub async fn handle(&self, message: Value) -> WireReply {
        let wire: WireRequest = match serde_json::from_value(message) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Rejecting malformed relay message: {}", e);
                return WireReply::error(format!("malformed message: {}", e));
            }
        };

        let request = match wire.decode() {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejecting relay request: {}", e);
                return WireReply::error(e.to_string());
            }
        };

        debug!("Dispatching relay command {}", request.command());
        match self.execute(&request).await {
            Ok(response) => WireReply::from_response(response)
                .unwrap_or_else(|e| WireReply::error(e.to_string())),
            Err(e) => WireReply::error(e.to_string()),
        }
    }

    async fn execute(&self, request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        match request {
            RelayRequest::FindId(id) => match self.handler.find_id(id).await {
                Ok(found) => Ok(RelayResponse::VideoId(found)),
                Err(e) => {
                    warn!("findId {} failed: {}", id, e);
                    Ok(RelayResponse::VideoId(None))
                }
            },
            RelayRequest::GetVideoInfo(id) => self
                .handler
                .get_video_info(id)
                .await
                .map(RelayResponse::VideoInfo),
            RelayRequest::AddToHistory(url) => match self.handler.add_to_history(url).await {
                Ok(()) => Ok(RelayResponse::Done),
                Err(RelayError::PermissionMissing(message)) => {
                    warn!("History not recorded: {}", message);
                    Ok(RelayResponse::Done)
                }
                Err(e) => Err(e),
            },
            RelayRequest::InjectPlayer => {
                self.handler.inject_player().await?;
                Ok(RelayResponse::Done)
            }
        }
    }
}

#[async_trait]
impl MessagePort for RelayDispatcher {
    async fn post(&self, message: Value) -> Result<Value, RelayError> {
        let reply = self.handle(message).await;
        Ok(serde_json::to_value(reply)?)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
