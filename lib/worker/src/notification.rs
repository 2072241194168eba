//! Bucket notification workers and registration overlap checks.

use crate::adapter::Adapter;
use crate::error::{NotificationOverlap, WorkerError};
use crate::worker::{Worker, WorkerKind, forward};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{
    BucketEventType, NotificationTarget, Trigger, TriggerResponse, WILDCARD_PREFIX,
    normalize_name,
};
use std::sync::Arc;

/// Receives notifications for objects under one prefix of one bucket.
pub struct BucketNotificationWorker {
    id: WorkerId,
    target: NotificationTarget,
    bucket: String,
    adapter: Option<Arc<dyn Adapter>>,
}

impl BucketNotificationWorker {
    pub fn new(target: NotificationTarget, adapter: Option<Arc<dyn Adapter>>) -> Self {
        Self {
            id: WorkerId::new(),
            bucket: normalize_name(&target.bucket),
            target,
            adapter,
        }
    }
}

#[async_trait]
impl Worker for BucketNotificationWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::BucketNotification
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger.as_notification().is_some_and(|n| {
            normalize_name(&n.bucket) == self.bucket
                && (self.target.event_type == BucketEventType::All
                    || self.target.event_type == n.event_type)
                && self.target.covers_key(&n.key)
        })
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        if trigger.as_notification().is_none() {
            return Err(WorkerError::UnsupportedTrigger {
                worker: self.kind(),
                trigger: trigger.kind(),
            }
            .into());
        }
        forward(self.id, self.adapter.as_ref(), trigger).await
    }

    fn notification_target(&self) -> Option<&NotificationTarget> {
        Some(&self.target)
    }
}

/// Checks a new registration against those already in place.
///
/// Two registrations on the same bucket conflict when their event types
/// overlap and one prefix starts with the other. The wildcard prefix starts
/// every key.
///
/// # Errors
///
/// Returns the first conflicting pair found.
pub fn validate_bucket_notifications<'a>(
    existing: impl IntoIterator<Item = &'a NotificationTarget>,
    new: &NotificationTarget,
) -> std::result::Result<(), NotificationOverlap> {
    let bucket = normalize_name(&new.bucket);
    let new_prefix = comparable_prefix(&new.prefix);

    for current in existing {
        if normalize_name(&current.bucket) != bucket
            || !current.event_type.overlaps(new.event_type)
        {
            continue;
        }

        let current_prefix = comparable_prefix(&current.prefix);
        if current_prefix.starts_with(new_prefix) || new_prefix.starts_with(current_prefix) {
            return Err(NotificationOverlap {
                bucket,
                existing_prefix: current.prefix.clone(),
                new_prefix: new.prefix.clone(),
            });
        }
    }
    Ok(())
}

fn comparable_prefix(prefix: &str) -> &str {
    if prefix == WILDCARD_PREFIX { "" } else { prefix }
}
