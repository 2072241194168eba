//! The live registry of workers.
//!
//! The pool enforces capacity and bucket notification exclusivity on add,
//! reports a fault when removals leave it below its minimum, and picks the
//! worker for each trigger.

use crate::config::PoolConfig;
use crate::error::PoolError;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{Trigger, TriggerKind};
use membrane_worker::{Worker, WorkerKind, validate_bucket_notifications};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

const MINIMUM_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Optional predicate applied to candidates before matching.
pub type WorkerFilter<'a> = &'a (dyn Fn(&dyn Worker) -> bool + Send + Sync);

type Workers = Vec<Arc<dyn Worker>>;

/// Workers in registration order, with capacity bounds and fault signaling.
pub struct WorkerPool {
    config: PoolConfig,
    workers: Mutex<Workers>,
    faults_tx: mpsc::UnboundedSender<PoolError>,
    faults_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PoolError>>,
}

/// Dispatch rank of a worker kind for a trigger kind; lower goes first.
fn rank(trigger: TriggerKind, worker: WorkerKind) -> u8 {
    match (trigger, worker) {
        (TriggerKind::Http, WorkerKind::Route)
        | (TriggerKind::Topic, WorkerKind::Subscription | WorkerKind::Schedule) => 0,
        _ => 1,
    }
}

impl WorkerPool {
    /// Creates an empty pool. The config is normalized first.
    pub fn new(config: PoolConfig) -> Self {
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        Self {
            config: config.normalized(),
            workers: Mutex::new(Vec::new()),
            faults_tx,
            faults_rx: tokio::sync::Mutex::new(faults_rx),
        }
    }

    fn workers(&self) -> MutexGuard<'_, Workers> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self, filter: Option<WorkerFilter<'_>>) -> Workers {
        self.workers()
            .iter()
            .filter(|w| filter.is_none_or(|keep| keep(w.as_ref())))
            .cloned()
            .collect()
    }

    pub fn min_workers(&self) -> usize {
        self.config.min_workers
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    pub fn worker_count(&self) -> usize {
        self.workers().len()
    }

    /// Registers a worker.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CapacityReached`] if the pool is full, or
    /// [`PoolError::OverlappingNotifications`] if a bucket notification worker
    /// overlaps one already registered.
    #[instrument(skip_all, fields(worker_id = %worker.id(), kind = %worker.kind()))]
    pub fn add_worker(&self, worker: Arc<dyn Worker>) -> Result<(), PoolError> {
        let mut workers = self.workers();
        if workers.len() >= self.config.max_workers {
            return Err(PoolError::CapacityReached {
                max: self.config.max_workers,
            }
            .into());
        }

        if let Some(target) = worker.notification_target() {
            validate_bucket_notifications(
                workers.iter().filter_map(|w| w.notification_target()),
                target,
            )
            .map_err(PoolError::from)?;
        }

        workers.push(worker);
        info!(live = workers.len(), "worker added");
        Ok(())
    }

    /// Removes a worker, signaling a fault if the pool drops below its
    /// minimum.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::WorkerNotRegistered`] if no worker has this id.
    #[instrument(skip(self))]
    pub fn remove_worker(&self, worker_id: WorkerId) -> Result<(), PoolError> {
        let live = {
            let mut workers = self.workers();
            let index = workers
                .iter()
                .position(|w| w.id() == worker_id)
                .ok_or(PoolError::WorkerNotRegistered { worker_id })?;
            workers.remove(index);
            workers.len()
        };
        info!(live, "worker removed");

        if live < self.config.min_workers {
            let fault = PoolError::InsufficientWorkers {
                live,
                min: self.config.min_workers,
            };
            warn!(error = %fault, "worker pool below minimum");
            if self.faults_tx.send(fault).is_err() {
                debug!("fault channel closed");
            }
        }
        Ok(())
    }

    /// Picks the worker for a trigger.
    ///
    /// Route workers are tried first for HTTP triggers, and subscription or
    /// schedule workers first for topic triggers. Otherwise, and within each
    /// rank, registration order decides.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NoMatchingWorker`] if no candidate matches.
    pub fn get_worker(
        &self,
        trigger: &Trigger,
        filter: Option<WorkerFilter<'_>>,
    ) -> Result<Arc<dyn Worker>, PoolError> {
        let kind = trigger.kind();
        let mut candidates = self.snapshot(filter);
        candidates.sort_by_key(|w| rank(kind, w.kind()));

        candidates
            .into_iter()
            .find(|w| w.matches(trigger))
            .ok_or_else(|| PoolError::NoMatchingWorker { kind }.into())
    }

    /// Every worker that matches a trigger, in registration order.
    pub fn get_workers(
        &self,
        trigger: &Trigger,
        filter: Option<WorkerFilter<'_>>,
    ) -> Vec<Arc<dyn Worker>> {
        self.snapshot(filter)
            .into_iter()
            .filter(|w| w.matches(trigger))
            .collect()
    }

    /// Waits until at least the minimum number of workers are registered.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MinimumWorkersTimeout`] if `timeout` elapses
    /// first. A zero timeout fails at once unless the minimum is already met.
    #[instrument(skip(self))]
    pub async fn wait_for_minimum_workers(&self, timeout: Duration) -> Result<(), PoolError> {
        let deadline = Instant::now() + timeout;
        loop {
            let live = self.worker_count();
            if live >= self.config.min_workers {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PoolError::MinimumWorkersTimeout {
                    live,
                    min: self.config.min_workers,
                    timeout,
                }
                .into());
            }
            tokio::time::sleep(MINIMUM_POLL_INTERVAL).await;
        }
    }

    /// Waits for the next pool fault.
    pub async fn monitor(&self) -> PoolError {
        let mut faults = self.faults_rx.lock().await;
        match faults.recv().await {
            Some(fault) => fault,
            // The pool owns a sender, so the channel never closes while it lives.
            None => std::future::pending().await,
        }
    }
}
