//! Websocket event workers.

use crate::adapter::Adapter;
use crate::error::WorkerError;
use crate::worker::{Worker, WorkerKind, forward};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{Trigger, TriggerResponse, WebsocketEvent};
use std::sync::Arc;

/// Handles one lifecycle event of one socket.
pub struct WebsocketWorker {
    id: WorkerId,
    socket: String,
    event: WebsocketEvent,
    adapter: Option<Arc<dyn Adapter>>,
}

impl WebsocketWorker {
    pub fn new(
        socket: impl Into<String>,
        event: WebsocketEvent,
        adapter: Option<Arc<dyn Adapter>>,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            socket: socket.into(),
            event,
            adapter,
        }
    }
}

#[async_trait]
impl Worker for WebsocketWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::Websocket
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger
            .as_websocket()
            .is_some_and(|ws| ws.socket == self.socket && ws.event == self.event)
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        if trigger.as_websocket().is_none() {
            return Err(WorkerError::UnsupportedTrigger {
                worker: self.kind(),
                trigger: trigger.kind(),
            }
            .into());
        }
        forward(self.id, self.adapter.as_ref(), trigger).await
    }
}
