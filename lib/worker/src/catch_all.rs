//! Fallback worker that accepts every trigger.

use crate::adapter::Adapter;
use crate::error::WorkerError;
use crate::worker::{Worker, WorkerKind, forward};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{Trigger, TriggerResponse};
use std::sync::Arc;

pub struct CatchAllWorker {
    id: WorkerId,
    adapter: Option<Arc<dyn Adapter>>,
}

impl CatchAllWorker {
    pub fn new(adapter: Option<Arc<dyn Adapter>>) -> Self {
        Self {
            id: WorkerId::new(),
            adapter,
        }
    }
}

#[async_trait]
impl Worker for CatchAllWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::CatchAll
    }

    fn matches(&self, _trigger: &Trigger) -> bool {
        true
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        forward(self.id, self.adapter.as_ref(), trigger).await
    }
}
