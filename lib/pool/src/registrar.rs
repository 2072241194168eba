//! Turns newly connected worker streams into pool members.
//!
//! The first message on a stream must be an init request carrying the
//! worker's registration. Accepted workers stay in the pool until their
//! stream faults.

use crate::error::RegistrationError;
use crate::pool::WorkerPool;
use membrane_core::Result;
use membrane_trigger::ClientContent;
use membrane_worker::{CorrelationAdapter, MessageSink, MessageSource, build_worker};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Registers worker streams with a pool.
#[derive(Clone)]
pub struct Registrar {
    pool: Arc<WorkerPool>,
    instrument: bool,
}

impl Registrar {
    /// Creates a registrar. With `instrument` set, registered workers are
    /// wrapped in tracing spans.
    pub fn new(pool: Arc<WorkerPool>, instrument: bool) -> Self {
        Self { pool, instrument }
    }

    /// Runs one worker stream from handshake to teardown.
    ///
    /// Returns once the stream has faulted and the worker has been removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails or the pool rejects the
    /// registration. The worker is not in the pool in either case.
    #[instrument(skip_all)]
    pub async fn serve<S, R>(&self, sink: S, mut source: R) -> Result<(), RegistrationError>
    where
        S: MessageSink + 'static,
        R: MessageSource,
    {
        let first = match source.recv().await {
            Ok(Some(message)) => message,
            Ok(None) => return Err(RegistrationError::ClosedBeforeHandshake.into()),
            Err(e) => {
                return Err(RegistrationError::Stream {
                    message: e.to_string(),
                }
                .into());
            }
        };
        let ClientContent::InitRequest(init) = first.content else {
            return Err(RegistrationError::HandshakeExpected.into());
        };
        let label = init.registration.label();

        let adapter = Arc::new(CorrelationAdapter::new(Arc::new(sink)));
        let worker = build_worker(&init.registration, adapter.clone(), self.instrument);
        let worker_id = worker.id();

        let added = self.pool.add_worker(worker).map_err(|report| {
            (
                report.current_context().is_registration_rejection(),
                report.to_string(),
            )
        });
        if let Err((rejection, reason)) = added {
            if rejection {
                warn!(registration = %label, %reason, "registration rejected");
            } else {
                error!(registration = %label, %reason, "failed to add worker");
            }
            if let Err(e) = adapter.acknowledge(&first.id, Some(reason.clone())).await {
                debug!(error = %e, "could not deliver rejection");
            }
            return Err(RegistrationError::Rejected { reason }.into());
        }

        if let Err(report) = adapter.acknowledge(&first.id, None).await {
            self.remove(worker_id);
            return Err(RegistrationError::Stream {
                message: report.to_string(),
            }
            .into());
        }
        info!(%worker_id, registration = %label, "worker registered");

        let (faults_tx, mut faults_rx) = mpsc::unbounded_channel();
        adapter.start(source, faults_tx).await;
        if let Some(fault) = faults_rx.recv().await {
            warn!(%worker_id, error = %fault, "worker stream fault");
        }

        self.remove(worker_id);
        Ok(())
    }

    fn remove(&self, worker_id: membrane_core::WorkerId) {
        if let Err(report) = self.pool.remove_worker(worker_id) {
            warn!(%worker_id, error = %report, "failed to remove worker");
        }
    }
}
