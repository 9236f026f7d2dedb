//! Content-side relay client.

use std::sync::Arc;

use hoverplay_protocols::{
    RelayError, RelayRequest, RelayResponse, RelayTransport, StreamCandidate, VideoInfo,
};
use tracing::debug;

use crate::formats::normalize_formats;
use crate::signature::{SignatureAlgorithm, SignatureDecoder};

/// Typed relay commands over a [`RelayTransport`].
#[derive(Clone)]
pub struct RelayClient {
    transport: Arc<dyn RelayTransport>,
    decoder: Arc<dyn SignatureDecoder>,
}

impl RelayClient {
    /// A client decoding ciphered streams with [`SignatureAlgorithm::v1`].
    pub fn new(transport: Arc<dyn RelayTransport>) -> Self {
        Self::with_decoder(transport, Arc::new(SignatureAlgorithm::v1()))
    }

    pub fn with_decoder(
        transport: Arc<dyn RelayTransport>,
        decoder: Arc<dyn SignatureDecoder>,
    ) -> Self {
        Self { transport, decoder }
    }

    /// Resolve an indirect id. `Ok(None)` when the relay found nothing.
    pub async fn find_id(&self, indirect_id: &str) -> Result<Option<String>, RelayError> {
        let request = RelayRequest::FindId(indirect_id.to_string());
        match self.transport.call(request).await? {
            RelayResponse::VideoId(id) => Ok(id.filter(|id| !id.is_empty())),
            _ => Err(RelayError::UnexpectedResponse("findId".to_string())),
        }
    }

    /// Playable stream candidates, best resolution first.
    pub async fn get_video_info(&self, video_id: &str) -> Result<Vec<StreamCandidate>, RelayError> {
        let request = RelayRequest::GetVideoInfo(video_id.to_string());
        let info = match self.transport.call(request).await? {
            RelayResponse::VideoInfo(info) => info,
            _ => return Err(RelayError::UnexpectedResponse("getVideoInfo".to_string())),
        };
        let candidates = match info {
            VideoInfo::Candidates(candidates) => candidates,
            VideoInfo::Formats(formats) => {
                debug!(
                    "Normalising {} stream formats with signature v{}",
                    formats.len(),
                    self.decoder.version()
                );
                normalize_formats(formats, self.decoder.as_ref())
            }
        };
        Ok(candidates)
    }

    pub async fn add_to_history(&self, url: &str) -> Result<(), RelayError> {
        self.expect_done(RelayRequest::AddToHistory(url.to_string()))
            .await
    }

    pub async fn inject_player(&self) -> Result<(), RelayError> {
        self.expect_done(RelayRequest::InjectPlayer).await
    }

    async fn expect_done(&self, request: RelayRequest) -> Result<(), RelayError> {
        let command = request.command();
        match self.transport.call(request).await? {
            RelayResponse::Done => Ok(()),
            _ => Err(RelayError::UnexpectedResponse(command.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
