//! Gateway-facing dispatch.
//!
//! Gateways hand a trigger to the pool and always get a response back:
//! failures are turned into the kind's unhandled or failed response instead
//! of an error.

use crate::pool::WorkerPool;
use futures::future::join_all;
use membrane_trigger::{Trigger, TriggerResponse};
use tracing::{debug, instrument, warn};

impl WorkerPool {
    /// Delivers a trigger to the single best matching worker.
    ///
    /// With no matching worker the response is the kind's unhandled response
    /// (HTTP 404). A worker failure becomes the failed response (HTTP 500).
    #[instrument(skip_all, fields(kind = %trigger.kind()))]
    pub async fn dispatch(&self, trigger: Trigger) -> TriggerResponse {
        let kind = trigger.kind();
        let worker = match self.get_worker(&trigger, None) {
            Ok(worker) => worker,
            Err(report) => {
                debug!(error = %report, "trigger not handled");
                return TriggerResponse::unhandled(kind, &report.to_string());
            }
        };

        match worker.handle(trigger).await {
            Ok(response) => response,
            Err(report) => {
                warn!(worker_id = %worker.id(), error = %report, "worker failed to handle trigger");
                TriggerResponse::failed(kind, &report.to_string())
            }
        }
    }

    /// Delivers a trigger to every matching worker.
    ///
    /// Succeeds only if at least one worker handled the trigger and every
    /// worker reported success.
    #[instrument(skip_all, fields(kind = %trigger.kind()))]
    pub async fn broadcast(&self, trigger: Trigger) -> TriggerResponse {
        let kind = trigger.kind();
        let workers = self.get_workers(&trigger, None);
        if workers.is_empty() {
            debug!("no subscribers");
            return TriggerResponse::unhandled(kind, "no worker available to handle trigger");
        }

        let results = join_all(workers.iter().map(|w| w.handle(trigger.clone()))).await;
        let mut success = true;
        for (worker, result) in workers.iter().zip(&results) {
            match result {
                Ok(response) if response.is_success() => {}
                Ok(_) => {
                    debug!(worker_id = %worker.id(), "worker reported failure");
                    success = false;
                }
                Err(report) => {
                    warn!(worker_id = %worker.id(), error = %report, "worker failed to handle trigger");
                    success = false;
                }
            }
        }
        TriggerResponse::outcome(kind, success)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PoolConfig;
    use crate::pool::WorkerPool;
    use crate::testing::{FailingAdapter, OutcomeAdapter};
    use membrane_trigger::{HttpResponse, Trigger, TriggerKind, TriggerResponse};
    use membrane_worker::{CatchAllWorker, RouteWorker, SubscriptionWorker};
    use std::sync::Arc;

    fn pool() -> WorkerPool {
        WorkerPool::new(PoolConfig {
            min_workers: 0,
            max_workers: 10,
        })
    }

    #[tokio::test]
    async fn unmatched_http_is_not_found() {
        let response = pool().dispatch(Trigger::http("GET", "/missing")).await;
        let TriggerResponse::Http(http) = response else {
            panic!("expected http response");
        };
        assert_eq!(http.status, 404);
        assert!(String::from_utf8_lossy(&http.body).contains("no worker available"));
    }

    #[tokio::test]
    async fn unmatched_topic_is_unsuccessful() {
        let response = pool().dispatch(Trigger::topic("orders", Vec::new())).await;
        assert_eq!(response, TriggerResponse::Topic { success: false });
    }

    #[tokio::test]
    async fn worker_failure_is_internal_error() {
        let pool = pool();
        pool.add_worker(Arc::new(CatchAllWorker::new(Some(Arc::new(FailingAdapter)))))
            .expect("add");

        let response = pool.dispatch(Trigger::http("GET", "/")).await;
        let TriggerResponse::Http(http) = response else {
            panic!("expected http response");
        };
        assert_eq!(http.status, 500);
    }

    #[tokio::test]
    async fn dispatch_returns_the_worker_response() {
        let pool = pool();
        pool.add_worker(Arc::new(RouteWorker::new(
            "public",
            "/orders/:id",
            vec!["GET".to_string()],
            Some(OutcomeAdapter::answering(TriggerResponse::Http(
                HttpResponse::text(200, "order"),
            ))),
        )))
        .expect("add");

        let response = pool.dispatch(Trigger::http("GET", "/orders/9")).await;
        assert_eq!(response, TriggerResponse::Http(HttpResponse::text(200, "order")));
    }

    #[tokio::test]
    async fn broadcast_succeeds_when_every_subscriber_does() {
        let pool = pool();
        for _ in 0..2 {
            pool.add_worker(Arc::new(SubscriptionWorker::new(
                "orders",
                Some(OutcomeAdapter::succeeding()),
            )))
            .expect("add");
        }

        let response = pool.broadcast(Trigger::topic("orders", Vec::new())).await;
        assert_eq!(response, TriggerResponse::Topic { success: true });
    }

    #[tokio::test]
    async fn broadcast_fails_if_any_subscriber_fails() {
        let pool = pool();
        pool.add_worker(Arc::new(SubscriptionWorker::new(
            "orders",
            Some(OutcomeAdapter::succeeding()),
        )))
        .expect("add");
        pool.add_worker(Arc::new(SubscriptionWorker::new(
            "orders",
            Some(Arc::new(FailingAdapter)),
        )))
        .expect("add");

        let response = pool.broadcast(Trigger::topic("orders", Vec::new())).await;
        assert_eq!(response, TriggerResponse::Topic { success: false });
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_fails() {
        let response = pool().broadcast(Trigger::topic("orders", Vec::new())).await;
        assert_eq!(response, TriggerResponse::outcome(TriggerKind::Topic, false));
    }
}
