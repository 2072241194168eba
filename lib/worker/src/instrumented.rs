//! Tracing decorator for workers.
//!
//! Wraps `handle` in a span named after the trigger, following the
//! OpenTelemetry field conventions so an exporter layer can pick them up.

use crate::error::WorkerError;
use crate::worker::{Worker, WorkerKind};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{NotificationTarget, Trigger, TriggerResponse};
use std::sync::Arc;
use tracing::field::Empty;
use tracing::{Instrument, Span};

/// A worker whose trigger handling is traced.
pub struct InstrumentedWorker {
    inner: Arc<dyn Worker>,
}

impl InstrumentedWorker {
    pub fn new(inner: Arc<dyn Worker>) -> Self {
        Self { inner }
    }
}

fn trigger_span(worker: &dyn Worker, trigger: &Trigger) -> Span {
    let span = tracing::info_span!(
        "handle_trigger",
        otel.name = Empty,
        otel.status_code = Empty,
        worker.id = %worker.id(),
        worker.kind = %worker.kind(),
        trigger.kind = %trigger.kind(),
        http.method = Empty,
        http.target = Empty,
        http.status_code = Empty,
        messaging.destination = Empty,
        error.message = Empty,
    );

    match trigger {
        Trigger::Http(http) => {
            span.record("otel.name", format!("{} {}", http.method, http.path).as_str());
            span.record("http.method", http.method.as_str());
            span.record("http.target", http.path.as_str());
        }
        Trigger::Topic(topic) => {
            span.record("otel.name", format!("topic-{}", topic.topic).as_str());
            span.record("messaging.destination", topic.topic.as_str());
        }
        Trigger::Notification(notification) => {
            span.record(
                "otel.name",
                format!("notification-{}", notification.bucket).as_str(),
            );
        }
        Trigger::Websocket(websocket) => {
            span.record("otel.name", format!("websocket-{}", websocket.socket).as_str());
        }
    }
    span
}

#[async_trait]
impl Worker for InstrumentedWorker {
    fn id(&self) -> WorkerId {
        self.inner.id()
    }

    fn kind(&self) -> WorkerKind {
        self.inner.kind()
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        self.inner.matches(trigger)
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        let span = trigger_span(self.inner.as_ref(), &trigger);

        let result = self.inner.handle(trigger).instrument(span.clone()).await;
        match &result {
            Ok(response) => {
                span.record("otel.status_code", "OK");
                if let TriggerResponse::Http(http) = response {
                    span.record("http.status_code", http.status);
                }
            }
            Err(report) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.message", tracing::field::display(report));
            }
        }
        result
    }

    fn notification_target(&self) -> Option<&NotificationTarget> {
        self.inner.notification_target()
    }
}
