//! Topic subscription and schedule workers.
//!
//! Schedules fire as ordinary topic messages on a topic named after the
//! normalized schedule key, so both variants match on topic name.

use crate::adapter::Adapter;
use crate::error::WorkerError;
use crate::worker::{Worker, WorkerKind, forward};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{Trigger, TriggerKind, TriggerResponse, normalize_name};
use std::sync::Arc;
use tracing::debug;

/// Receives messages published to one topic.
pub struct SubscriptionWorker {
    id: WorkerId,
    topic: String,
    adapter: Option<Arc<dyn Adapter>>,
}

impl SubscriptionWorker {
    pub fn new(topic: impl Into<String>, adapter: Option<Arc<dyn Adapter>>) -> Self {
        Self {
            id: WorkerId::new(),
            topic: topic.into(),
            adapter,
        }
    }
}

#[async_trait]
impl Worker for SubscriptionWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::Subscription
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger.as_topic().is_some_and(|t| t.topic == self.topic)
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        require_topic(self.kind(), &trigger)?;
        forward(self.id, self.adapter.as_ref(), trigger).await
    }
}

/// Runs whenever a named schedule fires.
pub struct ScheduleWorker {
    id: WorkerId,
    key: String,
    topic: String,
    adapter: Option<Arc<dyn Adapter>>,
}

impl ScheduleWorker {
    pub fn new(key: impl Into<String>, adapter: Option<Arc<dyn Adapter>>) -> Self {
        let key = key.into();
        Self {
            id: WorkerId::new(),
            topic: normalize_name(&key),
            key,
            adapter,
        }
    }
}

#[async_trait]
impl Worker for ScheduleWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::Schedule
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger.as_topic().is_some_and(|t| t.topic == self.topic)
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        require_topic(self.kind(), &trigger)?;
        debug!(schedule = %self.key, "schedule fired");
        forward(self.id, self.adapter.as_ref(), trigger).await
    }
}

fn require_topic(worker: WorkerKind, trigger: &Trigger) -> Result<(), WorkerError> {
    if trigger.kind() == TriggerKind::Topic {
        Ok(())
    } else {
        Err(WorkerError::UnsupportedTrigger {
            worker,
            trigger: trigger.kind(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::RecordingAdapter;

    #[test]
    fn subscription_matches_exact_topic() {
        let worker = SubscriptionWorker::new("orders", None);
        assert!(worker.matches(&Trigger::topic("orders", Vec::new())));
        assert!(!worker.matches(&Trigger::topic("orders-archive", Vec::new())));
        assert!(!worker.matches(&Trigger::topic("Orders", Vec::new())));
        assert!(!worker.matches(&Trigger::http("GET", "/orders")));
    }

    #[test]
    fn schedule_matches_normalized_key() {
        let worker = ScheduleWorker::new("Prune Customer Orders", None);
        assert!(worker.matches(&Trigger::topic("prune-customer-orders", Vec::new())));
        assert!(!worker.matches(&Trigger::topic("Prune Customer Orders", Vec::new())));
    }

    #[tokio::test]
    async fn schedule_forwards_topic_triggers() {
        let adapter = RecordingAdapter::succeeding();
        let worker = ScheduleWorker::new("nightly", Some(adapter.clone()));
        let response = worker
            .handle(Trigger::topic("nightly", Vec::new()))
            .await
            .expect("handle");
        assert_eq!(response, TriggerResponse::Topic { success: true });
        assert!(adapter.last().is_some());
    }

    #[tokio::test]
    async fn subscription_rejects_http() {
        let adapter = RecordingAdapter::succeeding();
        let worker = SubscriptionWorker::new("orders", Some(adapter.clone()));
        let err = worker
            .handle(Trigger::http("GET", "/"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subscription worker cannot handle http"));
        assert!(adapter.last().is_none());
    }
}
