//! HTTP route workers.

use crate::adapter::Adapter;
use crate::error::WorkerError;
use crate::path::extract_path_params;
use crate::worker::{Worker, WorkerKind, forward};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{Trigger, TriggerResponse};
use std::sync::Arc;
use tracing::debug;

/// Serves one path template of an API for a set of methods.
///
/// Matching requests are forwarded with the template's parameters attached
/// as `path_params`.
pub struct RouteWorker {
    id: WorkerId,
    api: String,
    path: String,
    methods: Vec<String>,
    adapter: Option<Arc<dyn Adapter>>,
}

impl RouteWorker {
    pub fn new(
        api: impl Into<String>,
        path: impl Into<String>,
        methods: Vec<String>,
        adapter: Option<Arc<dyn Adapter>>,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            api: api.into(),
            path: path.into(),
            methods,
            adapter,
        }
    }

    fn accepts_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

#[async_trait]
impl Worker for RouteWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::Route
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger.as_http().is_some_and(|http| {
            self.accepts_method(&http.method) && extract_path_params(&self.path, &http.path).is_ok()
        })
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        let kind = trigger.kind();
        let Trigger::Http(mut http) = trigger else {
            return Err(WorkerError::UnsupportedTrigger {
                worker: self.kind(),
                trigger: kind,
            }
            .into());
        };

        http.path_params = extract_path_params(&self.path, &http.path).map_err(WorkerError::from)?;
        debug!(api = %self.api, template = %self.path, path = %http.path, "routing request");
        forward(self.id, self.adapter.as_ref(), Trigger::Http(http)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::RecordingAdapter;

    fn customers(adapter: Option<Arc<dyn Adapter>>) -> RouteWorker {
        RouteWorker::new(
            "public",
            "/customers/:id",
            vec!["GET".to_string(), "PUT".to_string()],
            adapter,
        )
    }

    #[test]
    fn matches_method_and_template() {
        let worker = customers(None);
        assert!(worker.matches(&Trigger::http("GET", "/customers/42")));
        assert!(worker.matches(&Trigger::http("put", "/customers/42")));
        assert!(!worker.matches(&Trigger::http("POST", "/customers/42")));
        assert!(!worker.matches(&Trigger::http("GET", "/customers")));
        assert!(!worker.matches(&Trigger::topic("customers", Vec::new())));
    }

    #[tokio::test]
    async fn attaches_path_params_to_a_new_trigger() {
        let adapter = RecordingAdapter::succeeding();
        let worker = customers(Some(adapter.clone()));
        let original = Trigger::http("GET", "/customers/42");

        worker.handle(original.clone()).await.expect("handle");

        let forwarded = adapter.last().expect("forwarded trigger");
        let http = forwarded.as_http().expect("http");
        assert_eq!(http.path_params["id"], "42");
        assert!(original.as_http().expect("http").path_params.is_empty());
    }

    #[tokio::test]
    async fn non_matching_path_is_a_mismatch() {
        let worker = customers(Some(RecordingAdapter::succeeding()));
        let err = worker
            .handle(Trigger::http("GET", "/orders/42"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[tokio::test]
    async fn topic_trigger_is_unsupported() {
        let worker = customers(Some(RecordingAdapter::succeeding()));
        let err = worker
            .handle(Trigger::topic("orders", Vec::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("route worker cannot handle topic"));
    }
}
