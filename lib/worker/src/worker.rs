//! The worker abstraction.
//!
//! A worker declares which triggers it accepts (`matches`) and how it handles
//! them. Most variants forward to a remote worker process through an
//! [`Adapter`]; the pool only ever sees `dyn Worker`.

use crate::adapter::Adapter;
use crate::error::WorkerError;
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{NotificationTarget, Trigger, TriggerResponse};
use rootcause::prelude::ResultExt;
use std::fmt;
use std::sync::Arc;

/// The variant of a worker, used for dispatch priority and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    CatchAll,
    Route,
    Subscription,
    Schedule,
    BucketNotification,
    Websocket,
    LocalHttpForward,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CatchAll => "catch-all",
            Self::Route => "route",
            Self::Subscription => "subscription",
            Self::Schedule => "schedule",
            Self::BucketNotification => "bucket-notification",
            Self::Websocket => "websocket",
            Self::LocalHttpForward => "local-http-forward",
        };
        f.write_str(name)
    }
}

/// A registered handler for a subset of triggers.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Identity used for removal.
    fn id(&self) -> WorkerId;

    /// The worker's variant.
    fn kind(&self) -> WorkerKind;

    /// Returns true if this worker accepts the trigger.
    fn matches(&self, trigger: &Trigger) -> bool;

    /// Handles a trigger and returns its response.
    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError>;

    /// The bucket registration, for bucket notification workers only.
    fn notification_target(&self) -> Option<&NotificationTarget> {
        None
    }
}

/// Forwards a trigger through a worker's adapter and checks the response
/// kind against the trigger kind.
pub(crate) async fn forward(
    worker_id: WorkerId,
    adapter: Option<&Arc<dyn Adapter>>,
    trigger: Trigger,
) -> Result<TriggerResponse, WorkerError> {
    let adapter = adapter.ok_or(WorkerError::NoAdapter { worker_id })?;
    let expected = trigger.kind();

    let response = adapter
        .handle_trigger(trigger)
        .await
        .context(WorkerError::Forward { worker_id })?;

    let actual = response.kind();
    if actual != expected {
        return Err(WorkerError::UnexpectedResponse { expected, actual }.into());
    }
    Ok(response)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Adapters for exercising workers without a stream.

    use super::*;
    use crate::error::AdapterError;
    use std::sync::Mutex;

    /// Records every trigger it receives and answers with a fixed response.
    pub struct RecordingAdapter {
        pub received: Mutex<Vec<Trigger>>,
        pub response: Option<TriggerResponse>,
    }

    impl RecordingAdapter {
        /// Answers every trigger with a successful outcome of the same kind.
        pub fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                response: None,
            })
        }

        /// Answers every trigger with `response`.
        pub fn answering(response: TriggerResponse) -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                response: Some(response),
            })
        }

        pub fn last(&self) -> Option<Trigger> {
            self.received.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Adapter for RecordingAdapter {
        async fn handle_trigger(
            &self,
            trigger: Trigger,
        ) -> Result<TriggerResponse, AdapterError> {
            let kind = trigger.kind();
            self.received.lock().unwrap().push(trigger);
            Ok(self
                .response
                .clone()
                .unwrap_or_else(|| TriggerResponse::outcome(kind, true)))
        }
    }

    /// Fails every call as if the stream had closed.
    pub struct ClosedAdapter;

    #[async_trait]
    impl Adapter for ClosedAdapter {
        async fn handle_trigger(
            &self,
            _trigger: Trigger,
        ) -> Result<TriggerResponse, AdapterError> {
            Err(AdapterError::StreamClosed.into())
        }
    }
}
