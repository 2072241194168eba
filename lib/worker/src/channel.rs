//! In-process worker stream over tokio channels.
//!
//! Used to host workers inside the membrane process and to drive the adapter
//! from tests without a socket.

use crate::error::StreamError;
use crate::stream::{MessageSink, MessageSource};
use async_trait::async_trait;
use membrane_trigger::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

/// Membrane-side sending half.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Membrane-side receiving half.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<ClientMessage>,
}

/// The worker's end of an in-process stream.
///
/// Dropping it closes the stream from the worker side.
#[derive(Debug)]
pub struct WorkerEnd {
    tx: mpsc::UnboundedSender<ClientMessage>,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Creates a connected in-process stream.
#[must_use]
pub fn pair() -> (ChannelSink, ChannelSource, WorkerEnd) {
    let (server_tx, server_rx) = mpsc::unbounded_channel();
    let (client_tx, client_rx) = mpsc::unbounded_channel();
    (
        ChannelSink { tx: server_tx },
        ChannelSource { rx: client_rx },
        WorkerEnd {
            tx: client_tx,
            rx: server_rx,
        },
    )
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, message: ServerMessage) -> Result<(), StreamError> {
        self.tx.send(message).map_err(|_| StreamError::Closed)
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<ClientMessage>, StreamError> {
        Ok(self.rx.recv().await)
    }
}

impl WorkerEnd {
    /// Sends a message to the membrane.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the membrane side is gone.
    pub fn send(&self, message: ClientMessage) -> Result<(), StreamError> {
        self.tx.send(message).map_err(|_| StreamError::Closed)
    }

    /// Receives the next message from the membrane.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membrane_trigger::{TriggerResponse, WorkerRegistration};

    #[tokio::test]
    async fn messages_cross_both_directions() {
        let (sink, mut source, mut worker) = pair();

        worker
            .send(ClientMessage::init(WorkerRegistration::CatchAll))
            .expect("send init");
        let received = source.recv().await.expect("recv").expect("message");
        assert_eq!(received, ClientMessage::init(WorkerRegistration::CatchAll));

        sink.send(ServerMessage::init_response("", None))
            .await
            .expect("send ack");
        assert_eq!(
            worker.recv().await,
            Some(ServerMessage::init_response("", None))
        );
    }

    #[tokio::test]
    async fn dropping_worker_end_closes_both_halves() {
        let (sink, mut source, worker) = pair();
        drop(worker);

        assert_eq!(source.recv().await.expect("recv"), None);
        let err = sink
            .send(ServerMessage::init_response("", None))
            .await
            .unwrap_err();
        assert_eq!(err, StreamError::Closed);
    }

    #[tokio::test]
    async fn worker_send_fails_once_membrane_side_is_gone() {
        let (sink, source, worker) = pair();
        drop(sink);
        drop(source);

        let err = worker
            .send(ClientMessage::response(
                "tkt",
                TriggerResponse::Topic { success: true },
            ))
            .unwrap_err();
        assert_eq!(err, StreamError::Closed);
    }
}
