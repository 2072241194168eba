//! Adapters for exercising pool dispatch without worker processes.

use async_trait::async_trait;
use membrane_core::Result;
use membrane_trigger::{Trigger, TriggerResponse};
use membrane_worker::{Adapter, AdapterError};
use std::sync::Arc;

/// Answers every trigger with a fixed response, or a successful outcome of
/// the trigger's kind.
pub struct OutcomeAdapter {
    response: Option<TriggerResponse>,
}

impl OutcomeAdapter {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self { response: None })
    }

    pub fn answering(response: TriggerResponse) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response),
        })
    }
}

#[async_trait]
impl Adapter for OutcomeAdapter {
    async fn handle_trigger(&self, trigger: Trigger) -> Result<TriggerResponse, AdapterError> {
        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| TriggerResponse::outcome(trigger.kind(), true)))
    }
}

/// Fails every call as if the worker stream had closed.
pub struct FailingAdapter;

#[async_trait]
impl Adapter for FailingAdapter {
    async fn handle_trigger(&self, _trigger: Trigger) -> Result<TriggerResponse, AdapterError> {
        Err(AdapterError::StreamClosed.into())
    }
}
