//! Accepts worker connections and supervises the pool.
//!
//! Each TCP connection carries one worker stream framed as JSON lines. The
//! server waits for the configured minimum of workers, then runs until the
//! pool faults or shutdown is requested.

use crate::config::ServerConfig;
use crate::error::ServerError;
use membrane_core::Result;
use membrane_pool::{Registrar, WorkerPool};
use membrane_worker::{InstrumentedWorker, LineSink, LineSource, LocalHttpWorker, Worker};
use rootcause::prelude::ResultExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// The membrane server.
pub struct Server {
    config: ServerConfig,
    pool: Arc<WorkerPool>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let pool = Arc::new(WorkerPool::new(config.pool()));
        Self { config, pool }
    }

    /// The pool gateways dispatch triggers to.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Binds the worker listener on the configured service address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is unavailable.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.service_address;
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| ServerError::Bind {
                address: address.clone(),
                message: e.to_string(),
            })?;
        Ok(listener)
    }

    /// Serves worker connections until `shutdown` completes or the pool
    /// faults.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP forwarding cannot be set up, the minimum
    /// number of workers does not register in time, or the pool faults.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        if let Ok(address) = listener.local_addr() {
            info!(%address, "accepting worker connections");
        }
        let registrar = Registrar::new(Arc::clone(&self.pool), self.config.instrument_workers);
        let acceptor = tokio::spawn(accept_workers(listener, registrar));

        let result = self.supervise(shutdown).await;
        acceptor.abort();
        result
    }

    async fn supervise<F>(&self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        if self.config.http_forward {
            self.start_http_forward().await?;
        }

        self.pool
            .wait_for_minimum_workers(self.config.child_timeout())
            .await
            .context(ServerError::WorkersUnavailable)?;
        info!(workers = self.pool.worker_count(), "membrane ready");

        tokio::select! {
            fault = self.pool.monitor() => {
                Err(ServerError::PoolFault { reason: fault.to_string() }.into())
            }
            () = shutdown => {
                info!("shutdown requested");
                Ok(())
            }
        }
    }

    #[instrument(skip_all, fields(address = %self.config.child_address))]
    async fn start_http_forward(&self) -> Result<(), ServerError> {
        let address = self.config.child_address.clone();
        let forward = LocalHttpWorker::connect(address.clone())
            .await
            .context(ServerError::HttpForward {
                address: address.clone(),
            })?;

        let worker: Arc<dyn Worker> = if self.config.instrument_workers {
            Arc::new(InstrumentedWorker::new(Arc::new(forward)))
        } else {
            Arc::new(forward)
        };
        self.pool
            .add_worker(worker)
            .context(ServerError::HttpForward { address })?;
        Ok(())
    }
}

/// Delay before retrying `accept` after consecutive failures.
fn accept_backoff(failures: u32) -> Duration {
    ACCEPT_BACKOFF_MIN
        .saturating_mul(2_u32.saturating_pow(failures.saturating_sub(1)))
        .min(ACCEPT_BACKOFF_MAX)
}

async fn accept_workers(listener: TcpListener, registrar: Registrar) {
    let mut failures = 0_u32;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => {
                failures = 0;
                accepted
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = accept_backoff(failures);
                warn!(error = %e, ?delay, "failed to accept worker connection");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        let registrar = registrar.clone();
        tokio::spawn(
            async move {
                let (read, write) = stream.into_split();
                let result = registrar
                    .serve(LineSink::new(write), LineSource::new(BufReader::new(read)))
                    .await;
                match result {
                    Ok(()) => debug!("worker disconnected"),
                    Err(report) => warn!(error = %report, "worker registration failed"),
                }
            }
            .instrument(info_span!("worker_connection", %peer)),
        );
    }
}
