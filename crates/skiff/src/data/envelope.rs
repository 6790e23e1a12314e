use serde::{Deserialize, Serialize};

use super::headers::Headers;

/// The captured result of one physical HTTP call.
///
/// A transport failure is reported through `error`, never by failing the
/// call: status 0 plus a message means the connection itself broke.
/// HTTP error statuses (404, 500, ...) leave `error` empty; they are data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status:        Option<u16>,
    pub error:         Option<String>,
    pub raw_body:      Option<String>,
    pub decoded:       Option<serde_json::Value>,
    pub headers:       Headers,
    pub content_type:  Option<String>,
    pub effective_url: Option<String>,
    pub filename:      Option<String>,
}

impl ResponseEnvelope {
    /// Envelope for a connection/protocol failure.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// True when no transport error was recorded.
    pub fn ok(&self) -> bool {
        self.error.as_deref().is_none_or(str::is_empty)
    }
}

/// Caller-facing body view retained on the client between accessor calls.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    Text(String),
    Structured(serde_json::Value),
}
