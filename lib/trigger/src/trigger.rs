//! Trigger types.
//!
//! A trigger is an inbound event that a gateway has normalized into one of a
//! fixed set of kinds. The membrane never mutates a trigger it was given;
//! workers that enrich a trigger (route parameters) build a new one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Multi-valued string map used for headers and query parameters.
pub type MultiMap = HashMap<String, Vec<String>>;

/// The kind of a trigger, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// An HTTP request.
    Http,
    /// A topic message (also used for schedule firings).
    Topic,
    /// A storage bucket notification.
    Notification,
    /// A websocket event.
    Websocket,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Http => "http",
            Self::Topic => "topic",
            Self::Notification => "notification",
            Self::Websocket => "websocket",
        };
        f.write_str(name)
    }
}

/// Type of bucket event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEventType {
    /// Wildcard: any event type.
    All,
    /// An object was created or overwritten.
    Created,
    /// An object was deleted.
    Deleted,
}

impl BucketEventType {
    /// Returns true if the two event types can describe the same event.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self == other || self == Self::All || other == Self::All
    }
}

impl fmt::Display for BucketEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Created => "created",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Websocket lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsocketEvent {
    /// A client connected.
    Connect,
    /// A client disconnected.
    Disconnect,
    /// A client sent a message.
    Message,
}

impl fmt::Display for WebsocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Message => "message",
        };
        f.write_str(name)
    }
}

/// An HTTP request trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTrigger {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Request headers.
    #[serde(default)]
    pub headers: MultiMap,
    /// Query parameters.
    #[serde(default)]
    pub query: MultiMap,
    /// Raw request body.
    #[serde(default, with = "crate::body")]
    pub body: Vec<u8>,
    /// Parameters bound from the route's path template.
    #[serde(default)]
    pub path_params: HashMap<String, String>,
}

impl HttpTrigger {
    /// Creates a request with no headers, query or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: MultiMap::new(),
            query: MultiMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
        }
    }

    /// Adds a header value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Adds a query parameter value.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// A topic message trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTrigger {
    /// Topic name.
    pub topic: String,
    /// Content type of the message, if known.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Raw message payload.
    #[serde(default, with = "crate::body")]
    pub body: Vec<u8>,
}

/// A bucket notification trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTrigger {
    /// Name of the bucket that emitted the notification.
    pub bucket: String,
    /// Key of the object the event refers to.
    pub key: String,
    /// What happened to the object.
    pub event_type: BucketEventType,
}

/// A websocket event trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsocketTrigger {
    /// Name of the socket.
    pub socket: String,
    /// The lifecycle event.
    pub event: WebsocketEvent,
    /// Gateway-assigned connection id.
    pub connection_id: String,
    /// Message payload (empty for connect/disconnect).
    #[serde(default, with = "crate::body")]
    pub body: Vec<u8>,
}

/// An inbound event routed to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// HTTP request.
    Http(HttpTrigger),
    /// Topic message.
    Topic(TopicTrigger),
    /// Bucket notification.
    Notification(NotificationTrigger),
    /// Websocket event.
    Websocket(WebsocketTrigger),
}

impl Trigger {
    /// Shorthand for a bodiless HTTP trigger.
    #[must_use]
    pub fn http(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Http(HttpTrigger::new(method, path))
    }

    /// Shorthand for a topic trigger.
    #[must_use]
    pub fn topic(topic: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::Topic(TopicTrigger {
            topic: topic.into(),
            mime_type: None,
            body: body.into(),
        })
    }

    /// Shorthand for a bucket notification trigger.
    #[must_use]
    pub fn notification(
        bucket: impl Into<String>,
        key: impl Into<String>,
        event_type: BucketEventType,
    ) -> Self {
        Self::Notification(NotificationTrigger {
            bucket: bucket.into(),
            key: key.into(),
            event_type,
        })
    }

    /// Shorthand for a websocket trigger.
    #[must_use]
    pub fn websocket(
        socket: impl Into<String>,
        event: WebsocketEvent,
        connection_id: impl Into<String>,
    ) -> Self {
        Self::Websocket(WebsocketTrigger {
            socket: socket.into(),
            event,
            connection_id: connection_id.into(),
            body: Vec::new(),
        })
    }

    /// Returns the trigger kind.
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Http(_) => TriggerKind::Http,
            Self::Topic(_) => TriggerKind::Topic,
            Self::Notification(_) => TriggerKind::Notification,
            Self::Websocket(_) => TriggerKind::Websocket,
        }
    }

    /// Returns the HTTP request, if this is an HTTP trigger.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpTrigger> {
        match self {
            Self::Http(http) => Some(http),
            _ => None,
        }
    }

    /// Returns the topic message, if this is a topic trigger.
    #[must_use]
    pub fn as_topic(&self) -> Option<&TopicTrigger> {
        match self {
            Self::Topic(topic) => Some(topic),
            _ => None,
        }
    }

    /// Returns the notification, if this is a notification trigger.
    #[must_use]
    pub fn as_notification(&self) -> Option<&NotificationTrigger> {
        match self {
            Self::Notification(notification) => Some(notification),
            _ => None,
        }
    }

    /// Returns the websocket event, if this is a websocket trigger.
    #[must_use]
    pub fn as_websocket(&self) -> Option<&WebsocketTrigger> {
        match self {
            Self::Websocket(websocket) => Some(websocket),
            _ => None,
        }
    }
}
