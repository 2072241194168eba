//! Trigger responses returned by workers.

use crate::trigger::{MultiMap, TriggerKind};
use serde::{Deserialize, Serialize};

/// An HTTP response produced by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: MultiMap,
    /// Raw response body.
    #[serde(default, with = "crate::body")]
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = MultiMap::new();
        headers.insert(
            "Content-Type".to_string(),
            vec!["text/plain; charset=utf-8".to_string()],
        );
        Self {
            status,
            headers,
            body: body.into().into_bytes(),
        }
    }
}

/// Kind-specific result of handling a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerResponse {
    /// Response to an HTTP trigger.
    Http(HttpResponse),
    /// Outcome of a topic message.
    Topic {
        /// Whether the worker processed the message.
        success: bool,
    },
    /// Outcome of a bucket notification.
    Notification {
        /// Whether the worker processed the notification.
        success: bool,
    },
    /// Outcome of a websocket event.
    Websocket {
        /// Whether the worker processed the event.
        success: bool,
    },
}

impl TriggerResponse {
    /// Returns the trigger kind this response answers.
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Http(_) => TriggerKind::Http,
            Self::Topic { .. } => TriggerKind::Topic,
            Self::Notification { .. } => TriggerKind::Notification,
            Self::Websocket { .. } => TriggerKind::Websocket,
        }
    }

    /// Returns true for a 2xx/3xx HTTP status or a successful event outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Http(http) => (200..400).contains(&http.status),
            Self::Topic { success }
            | Self::Notification { success }
            | Self::Websocket { success } => *success,
        }
    }

    /// Builds an event-style outcome for the given trigger kind.
    ///
    /// HTTP outcomes map to `200 OK` / `500` with an empty body.
    #[must_use]
    pub fn outcome(kind: TriggerKind, success: bool) -> Self {
        match kind {
            TriggerKind::Http => Self::Http(HttpResponse {
                status: if success { 200 } else { 500 },
                headers: MultiMap::new(),
                body: Vec::new(),
            }),
            TriggerKind::Topic => Self::Topic { success },
            TriggerKind::Notification => Self::Notification { success },
            TriggerKind::Websocket => Self::Websocket { success },
        }
    }

    /// The response a gateway returns when no worker accepted the trigger.
    #[must_use]
    pub fn unhandled(kind: TriggerKind, reason: &str) -> Self {
        match kind {
            TriggerKind::Http => Self::Http(HttpResponse::text(404, reason)),
            other => Self::outcome(other, false),
        }
    }

    /// The response a gateway returns when the selected worker failed.
    #[must_use]
    pub fn failed(kind: TriggerKind, reason: &str) -> Self {
        match kind {
            TriggerKind::Http => Self::Http(HttpResponse::text(500, reason)),
            other => Self::outcome(other, false),
        }
    }
}
