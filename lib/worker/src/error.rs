//! Error types for the worker crate.
//!
//! Errors are layered with rootcause:
//! - `StreamError`: transport failures reading or writing one worker stream
//! - `AdapterError`: correlation failures on top of a stream
//! - `WorkerError`: failures handling a trigger (wraps adapter errors via context)
//!
//! `PathTemplateMismatch` and `NotificationOverlap` are plain values returned
//! by the matching helpers; callers decide whether they are fatal.

use crate::worker::WorkerKind;
use membrane_core::{TicketId, WorkerId};
use membrane_trigger::TriggerKind;
use std::fmt;

/// Errors from a stream transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The other end has gone away.
    Closed,
    /// Reading or writing the underlying transport failed.
    Io { message: String },
    /// An inbound message could not be decoded.
    Decode { message: String },
    /// An outbound message could not be encoded.
    Encode { message: String },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "stream closed"),
            Self::Io { message } => write!(f, "stream i/o failed: {message}"),
            Self::Decode { message } => write!(f, "failed to decode message: {message}"),
            Self::Encode { message } => write!(f, "failed to encode message: {message}"),
        }
    }
}

impl std::error::Error for StreamError {}

/// Errors from the correlation adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// A response arrived for a ticket that is not outstanding.
    UnknownTicket { id: String },
    /// The stream failed while reading.
    Stream { message: String },
    /// The stream ended while a call was outstanding.
    StreamClosed,
    /// A message could not be written to the stream.
    SendFailed { message: String },
}

impl AdapterError {
    pub(crate) fn unknown_ticket(id: &TicketId) -> Self {
        Self::UnknownTicket { id: id.to_string() }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTicket { id } => write!(f, "no outstanding ticket with id '{id}'"),
            Self::Stream { message } => write!(f, "worker stream failed: {message}"),
            Self::StreamClosed => write!(f, "worker stream closed"),
            Self::SendFailed { message } => write!(f, "failed to send to worker: {message}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Errors handling a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker was asked to handle a trigger kind it cannot handle.
    UnsupportedTrigger {
        worker: WorkerKind,
        trigger: TriggerKind,
    },
    /// The worker has no adapter to forward through.
    NoAdapter { worker_id: WorkerId },
    /// Forwarding to the worker process failed (use as context wrapper).
    Forward { worker_id: WorkerId },
    /// The request path does not fit the route template.
    PathMismatch(PathTemplateMismatch),
    /// The local HTTP server could not be reached or answered badly.
    LocalHttp { message: String },
    /// The worker process answered with a response of the wrong kind.
    UnexpectedResponse {
        expected: TriggerKind,
        actual: TriggerKind,
    },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedTrigger { worker, trigger } => {
                write!(f, "{worker} worker cannot handle {trigger} triggers")
            }
            Self::NoAdapter { worker_id } => {
                write!(f, "worker {worker_id} has no adapter")
            }
            Self::Forward { worker_id } => {
                write!(f, "failed to forward trigger to worker {worker_id}")
            }
            Self::PathMismatch(mismatch) => write!(f, "{mismatch}"),
            Self::LocalHttp { message } => write!(f, "local http forward failed: {message}"),
            Self::UnexpectedResponse { expected, actual } => {
                write!(f, "expected a {expected} response, got {actual}")
            }
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<PathTemplateMismatch> for WorkerError {
    fn from(e: PathTemplateMismatch) -> Self {
        Self::PathMismatch(e)
    }
}

/// A request path that does not fit a route's path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTemplateMismatch {
    /// Template and path have a different number of segments.
    SegmentCount { template: String, path: String },
    /// A literal template segment differs from the path segment.
    Literal { expected: String, actual: String },
}

impl fmt::Display for PathTemplateMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentCount { template, path } => {
                write!(f, "path '{path}' has a different segment count than '{template}'")
            }
            Self::Literal { expected, actual } => {
                write!(f, "path segment '{actual}' does not match '{expected}'")
            }
        }
    }
}

impl std::error::Error for PathTemplateMismatch {}

/// Two bucket notification registrations would both receive some event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOverlap {
    /// Normalized bucket name.
    pub bucket: String,
    /// Prefix already registered.
    pub existing_prefix: String,
    /// Prefix being registered.
    pub new_prefix: String,
}

impl fmt::Display for NotificationOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bucket '{}' notification prefix '{}' overlaps existing prefix '{}'",
            self.bucket, self.new_prefix, self.existing_prefix
        )
    }
}

impl std::error::Error for NotificationOverlap {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_message_names_both_prefixes() {
        let overlap = NotificationOverlap {
            bucket: "images".to_string(),
            existing_prefix: "/product".to_string(),
            new_prefix: "/product/images".to_string(),
        };
        let message = overlap.to_string();
        assert!(message.contains("'/product'"));
        assert!(message.contains("'/product/images'"));
        assert!(message.contains("'images'"));
    }

    #[test]
    fn unsupported_trigger_names_both_kinds() {
        let err = WorkerError::UnsupportedTrigger {
            worker: WorkerKind::Route,
            trigger: TriggerKind::Topic,
        };
        assert_eq!(err.to_string(), "route worker cannot handle topic triggers");
    }
}
