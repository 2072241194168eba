//! Worker registrations.
//!
//! A worker process opens its stream with a registration declaring which
//! triggers it wants. The membrane turns the declaration into a matching
//! worker; the criteria never change afterwards.

use crate::trigger::{BucketEventType, WebsocketEvent};
use serde::{Deserialize, Serialize};

/// Prefix filter that matches every object key.
pub const WILDCARD_PREFIX: &str = "*";

/// Normalizes a resource name the way deployed topics and buckets are named:
/// lower-cased, with spaces replaced by hyphens.
///
/// Schedules are delivered as topic messages on the normalized schedule key,
/// so `"Prune Customer Orders"` fires on topic `prune-customer-orders`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Bucket, prefix and event type a notification worker listens for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationTarget {
    /// Bucket name as declared.
    pub bucket: String,
    /// Object key prefix, or `*` for every key.
    pub prefix: String,
    /// Event type, `All` for any.
    pub event_type: BucketEventType,
}

impl NotificationTarget {
    /// Creates a notification target.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        event_type: BucketEventType,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            event_type,
        }
    }

    /// Returns true if the prefix is the wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.prefix == WILDCARD_PREFIX
    }

    /// Returns true if an object key falls under this target's prefix.
    #[must_use]
    pub fn covers_key(&self, key: &str) -> bool {
        self.is_wildcard() || key.starts_with(&self.prefix)
    }
}

/// What a worker process declares when it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerRegistration {
    /// Accept any trigger.
    CatchAll,
    /// Serve an HTTP route.
    Route {
        /// API the route belongs to.
        api: String,
        /// Path template, e.g. `/customers/:id`.
        path: String,
        /// Accepted HTTP methods.
        methods: Vec<String>,
    },
    /// Subscribe to a topic.
    Subscription {
        /// Topic name.
        topic: String,
    },
    /// Run on a schedule.
    Schedule {
        /// Human-readable schedule key.
        key: String,
    },
    /// Receive bucket notifications.
    BucketNotification(NotificationTarget),
    /// Handle websocket events.
    Websocket {
        /// Socket name.
        socket: String,
        /// Event to handle.
        event: WebsocketEvent,
    },
}

impl WorkerRegistration {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::CatchAll => "catch-all".to_string(),
            Self::Route { api, path, methods } => {
                format!("route {api} {} {path}", methods.join(","))
            }
            Self::Subscription { topic } => format!("subscription {topic}"),
            Self::Schedule { key } => format!("schedule {key}"),
            Self::BucketNotification(target) => format!(
                "bucket {} {} {}",
                target.bucket, target.prefix, target.event_type
            ),
            Self::Websocket { socket, event } => format!("websocket {socket} {event}"),
        }
    }
}
