//! Builds workers from the registrations worker processes declare.

use crate::adapter::Adapter;
use crate::catch_all::CatchAllWorker;
use crate::instrumented::InstrumentedWorker;
use crate::notification::BucketNotificationWorker;
use crate::route::RouteWorker;
use crate::topic::{ScheduleWorker, SubscriptionWorker};
use crate::websocket::WebsocketWorker;
use crate::worker::Worker;
use membrane_trigger::WorkerRegistration;
use std::sync::Arc;

/// Creates the worker a registration describes, bound to `adapter`.
///
/// With `instrument` set the worker is wrapped in an [`InstrumentedWorker`].
pub fn build_worker(
    registration: &WorkerRegistration,
    adapter: Arc<dyn Adapter>,
    instrument: bool,
) -> Arc<dyn Worker> {
    let adapter = Some(adapter);
    let worker: Arc<dyn Worker> = match registration {
        WorkerRegistration::CatchAll => Arc::new(CatchAllWorker::new(adapter)),
        WorkerRegistration::Route { api, path, methods } => Arc::new(RouteWorker::new(
            api.clone(),
            path.clone(),
            methods.clone(),
            adapter,
        )),
        WorkerRegistration::Subscription { topic } => {
            Arc::new(SubscriptionWorker::new(topic.clone(), adapter))
        }
        WorkerRegistration::Schedule { key } => Arc::new(ScheduleWorker::new(key.clone(), adapter)),
        WorkerRegistration::BucketNotification(target) => {
            Arc::new(BucketNotificationWorker::new(target.clone(), adapter))
        }
        WorkerRegistration::Websocket { socket, event } => {
            Arc::new(WebsocketWorker::new(socket.clone(), *event, adapter))
        }
    };

    if instrument {
        Arc::new(InstrumentedWorker::new(worker))
    } else {
        worker
    }
}
