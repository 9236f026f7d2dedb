//! Relay wire codec.
//!
//! Requests travel as `{"cmd": <name>, "args": [...]}`; replies as
//! `{"data": ...}` or `{"error": ...}`.

use async_trait::async_trait;
use hoverplay_protocols::{RelayError, RelayRequest, RelayResponse, RelayTransport, VideoInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A request as it crosses the context boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl From<&RelayRequest> for WireRequest {
    fn from(request: &RelayRequest) -> Self {
        let args = match request {
            RelayRequest::FindId(id) | RelayRequest::GetVideoInfo(id) => {
                vec![Value::String(id.clone())]
            }
            RelayRequest::AddToHistory(url) => vec![Value::String(url.clone())],
            RelayRequest::InjectPlayer => Vec::new(),
        };
        Self {
            cmd: request.command().to_string(),
            args,
        }
    }
}

impl WireRequest {
    /// Validate command name, arity and argument types.
    pub fn decode(&self) -> Result<RelayRequest, RelayError> {
        match self.cmd.as_str() {
            "findId" => Ok(RelayRequest::FindId(self.single_string()?)),
            "getVideoInfo" => Ok(RelayRequest::GetVideoInfo(self.single_string()?)),
            "addToHistory" => Ok(RelayRequest::AddToHistory(self.single_string()?)),
            "injectPlayer" => {
                self.expect_arity(0)?;
                Ok(RelayRequest::InjectPlayer)
            }
            other => Err(RelayError::UnknownCommand(other.to_string())),
        }
    }

    fn expect_arity(&self, arity: usize) -> Result<(), RelayError> {
        if self.args.len() == arity {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "expected {} argument(s), got {}",
                arity,
                self.args.len()
            )))
        }
    }

    fn single_string(&self) -> Result<String, RelayError> {
        self.expect_arity(1)?;
        match &self.args[0] {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            Value::String(_) => Err(self.invalid("argument is empty".to_string())),
            other => Err(self.invalid(format!("expected a string, got {}", other))),
        }
    }

    fn invalid(&self, message: String) -> RelayError {
        RelayError::InvalidArguments {
            command: self.cmd.clone(),
            message,
        }
    }
}

/// A reply as it crosses the context boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireReply {
    Error { error: Value },
    Data { data: Value },
}

impl WireReply {
    pub fn data(data: Value) -> Self {
        WireReply::Data { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WireReply::Error {
            error: Value::String(message.into()),
        }
    }

    /// Encode a handler response.
    pub fn from_response(response: RelayResponse) -> Result<Self, RelayError> {
        let data = match response {
            RelayResponse::VideoId(id) => id.map(Value::String).unwrap_or(Value::Null),
            RelayResponse::VideoInfo(info) => serde_json::to_value(info)?,
            RelayResponse::Done => Value::Null,
        };
        Ok(WireReply::data(data))
    }

    /// Decode the reply to `request` into its typed response.
    pub fn into_response(self, request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        let command = request.command();
        let data = match self {
            WireReply::Error { error } => {
                let message = match error {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Err(RelayError::Rejected {
                    command: command.to_string(),
                    message,
                });
            }
            WireReply::Data { data } => data,
        };

        match request {
            RelayRequest::FindId(_) => match data {
                Value::Null => Ok(RelayResponse::VideoId(None)),
                Value::String(s) if s.is_empty() => Ok(RelayResponse::VideoId(None)),
                Value::String(s) => Ok(RelayResponse::VideoId(Some(s))),
                other => Err(malformed(command, format!("expected an id, got {}", other))),
            },
            RelayRequest::GetVideoInfo(_) => serde_json::from_value::<VideoInfo>(data)
                .map(RelayResponse::VideoInfo)
                .map_err(|e| malformed(command, e.to_string())),
            RelayRequest::AddToHistory(_) | RelayRequest::InjectPlayer => Ok(RelayResponse::Done),
        }
    }
}

fn malformed(command: &str, message: String) -> RelayError {
    RelayError::MalformedReply {
        command: command.to_string(),
        message,
    }
}

/// One message round-trip to the background context.
#[async_trait]
pub trait MessagePort: Send + Sync {
    async fn post(&self, message: Value) -> Result<Value, RelayError>;
}

/// A [`RelayTransport`] speaking the wire codec over a [`MessagePort`].
pub struct PortTransport<P> {
    port: P,
}

impl<P: MessagePort> PortTransport<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

#[async_trait]
impl<P: MessagePort> RelayTransport for PortTransport<P> {
    async fn call(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let message = serde_json::to_value(WireRequest::from(&request))?;
        debug!("Relay request: {}", message);

        let raw = self.port.post(message).await?;
        let reply: WireReply = serde_json::from_value(raw)
            .map_err(|e| malformed(request.command(), e.to_string()))?;
        reply.into_response(&request)
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
