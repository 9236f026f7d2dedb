//! A canned background context.
//!
//! Answers relay commands from a [`RelayScript`] instead of the network and
//! records every call. Used by the engine tests and the replay CLI.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hoverplay_protocols::{RelayError, RelayRequest, VideoInfo};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::dispatch::{RelayDispatcher, RelayHandler};
use crate::wire::PortTransport;

/// Canned answers of a [`ScriptedRelay`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayScript {
    /// Indirect id to resolved id; `null` means the shared page had no id.
    #[serde(default)]
    pub ids: HashMap<String, Option<String>>,

    /// Video id to the stream info the relay answers with.
    #[serde(default)]
    pub video_info: HashMap<String, VideoInfo>,

    #[serde(default = "default_true")]
    pub history_permission: bool,

    #[serde(default)]
    pub inject_fails: bool,

    /// Simulated round-trip time of every command.
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for RelayScript {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            video_info: HashMap::new(),
            history_permission: true,
            inject_fails: false,
            latency_ms: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Default)]
struct Recorded {
    calls: Vec<RelayRequest>,
    history: Vec<String>,
}

/// A [`RelayHandler`] answering from a [`RelayScript`].
#[derive(Clone)]
pub struct ScriptedRelay {
    script: Arc<RelayScript>,
    recorded: Arc<Mutex<Recorded>>,
}

impl ScriptedRelay {
    pub fn new(script: RelayScript) -> Self {
        Self {
            script: Arc::new(script),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    /// Every command that reached the handler, in order.
    pub fn calls(&self) -> Vec<RelayRequest> {
        self.recorded.lock().calls.clone()
    }

    /// URLs actually written to the history.
    pub fn history(&self) -> Vec<String> {
        self.recorded.lock().history.clone()
    }

    /// A content-side transport whose messages go through a dispatcher in
    /// front of this handler.
    pub fn transport(&self) -> PortTransport<RelayDispatcher> {
        PortTransport::new(RelayDispatcher::new(Arc::new(self.clone())))
    }

    async fn enter(&self, request: RelayRequest) {
        self.recorded.lock().calls.push(request);
        if self.script.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.script.latency_ms)).await;
        }
    }
}

#[async_trait]
impl RelayHandler for ScriptedRelay {
    async fn find_id(&self, indirect_id: &str) -> Result<Option<String>, RelayError> {
        self.enter(RelayRequest::FindId(indirect_id.to_string()))
            .await;
        match self.script.ids.get(indirect_id) {
            Some(found) => Ok(found.clone()),
            None => Err(RelayError::Rejected {
                command: "findId".to_string(),
                message: format!("no shared page for {}", indirect_id),
            }),
        }
    }

    async fn get_video_info(&self, video_id: &str) -> Result<VideoInfo, RelayError> {
        self.enter(RelayRequest::GetVideoInfo(video_id.to_string()))
            .await;
        self.script
            .video_info
            .get(video_id)
            .cloned()
            .ok_or_else(|| RelayError::Rejected {
                command: "getVideoInfo".to_string(),
                message: format!("video {} unavailable", video_id),
            })
    }

    async fn add_to_history(&self, url: &str) -> Result<(), RelayError> {
        self.enter(RelayRequest::AddToHistory(url.to_string())).await;
        if !self.script.history_permission {
            return Err(RelayError::PermissionMissing(
                "re-enable the history option".to_string(),
            ));
        }
        self.recorded.lock().history.push(url.to_string());
        Ok(())
    }

    async fn inject_player(&self) -> Result<(), RelayError> {
        self.enter(RelayRequest::InjectPlayer).await;
        if self.script.inject_fails {
            return Err(RelayError::Rejected {
                command: "injectPlayer".to_string(),
                message: "cannot access frame".to_string(),
            });
        }
        Ok(())
    }
}
