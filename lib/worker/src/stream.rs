//! The seam between the correlation adapter and a worker transport.
//!
//! A worker stream is split into a shareable sending half and an exclusive
//! receiving half. The adapter writes from many concurrent callers while a
//! single read loop owns the source.

use crate::error::StreamError;
use async_trait::async_trait;
use membrane_trigger::{ClientMessage, ServerMessage};

/// Sending half of a worker stream.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Writes one message to the worker.
    async fn send(&self, message: ServerMessage) -> Result<(), StreamError>;
}

/// Receiving half of a worker stream.
#[async_trait]
pub trait MessageSource: Send {
    /// Reads the next message, or `None` once the worker closed the stream.
    async fn recv(&mut self) -> Result<Option<ClientMessage>, StreamError>;
}

#[async_trait]
impl<S: MessageSink + ?Sized> MessageSink for std::sync::Arc<S> {
    async fn send(&self, message: ServerMessage) -> Result<(), StreamError> {
        (**self).send(message).await
    }
}

#[async_trait]
impl<S: MessageSource + ?Sized> MessageSource for Box<S> {
    async fn recv(&mut self) -> Result<Option<ClientMessage>, StreamError> {
        (**self).recv().await
    }
}
