//! Forwards HTTP triggers to a server listening on a local address.
//!
//! Used when the function process is a plain HTTP server instead of a
//! stream-speaking worker.

use crate::error::WorkerError;
use crate::worker::{Worker, WorkerKind};
use async_trait::async_trait;
use membrane_core::{Result, WorkerId};
use membrane_trigger::{HttpResponse, HttpTrigger, MultiMap, Trigger, TriggerResponse};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

const DIAL_INTERVAL: Duration = Duration::from_millis(15);
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

const AUTHORIZATION: &str = "Authorization";
const FORWARDED_AUTHORIZATION: &str = "X-Forwarded-Authorization";

/// Proxies every HTTP trigger to `http://<address><path>`.
pub struct LocalHttpWorker {
    id: WorkerId,
    address: String,
    client: reqwest::Client,
}

impl LocalHttpWorker {
    /// Waits for the local server to accept connections, then creates the
    /// worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::LocalHttp`] if the address is not dialable
    /// within five seconds.
    pub async fn connect(address: impl Into<String>) -> Result<Self, WorkerError> {
        Self::connect_within(address, DIAL_TIMEOUT).await
    }

    /// Like [`connect`](Self::connect) with a custom deadline.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::LocalHttp`] if the address is not dialable
    /// before `timeout` elapses.
    #[instrument(skip_all, fields(address))]
    pub async fn connect_within(
        address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WorkerError> {
        let address = address.into();
        tracing::Span::current().record("address", address.as_str());

        let deadline = Instant::now() + timeout;
        loop {
            match TcpStream::connect(&address).await {
                Ok(_) => break,
                Err(e) if Instant::now() >= deadline => {
                    return Err(WorkerError::LocalHttp {
                        message: format!("{address} not reachable after {timeout:?}: {e}"),
                    }
                    .into());
                }
                Err(e) => {
                    debug!(error = %e, "local server not ready");
                    tokio::time::sleep(DIAL_INTERVAL).await;
                }
            }
        }
        info!("local server reachable");

        Ok(Self {
            id: WorkerId::new(),
            address,
            client: reqwest::Client::new(),
        })
    }

    async fn forward(&self, mut http: HttpTrigger) -> Result<HttpResponse, WorkerError> {
        let method = reqwest::Method::from_bytes(http.method.as_bytes()).map_err(|e| {
            WorkerError::LocalHttp {
                message: format!("invalid method '{}': {e}", http.method),
            }
        })?;
        let url = format!("http://{}{}", self.address, http.path);

        remap_forwarded_authorization(&mut http.headers);
        let query: Vec<(&str, &str)> = http
            .query
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
            .collect();

        let mut request = self.client.request(method, &url).query(&query);
        for (name, values) in &http.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            for value in values {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request
            .body(http.body)
            .send()
            .await
            .map_err(|e| WorkerError::LocalHttp {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let mut headers = MultiMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::LocalHttp {
                message: e.to_string(),
            })?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Worker for LocalHttpWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> WorkerKind {
        WorkerKind::LocalHttpForward
    }

    fn matches(&self, trigger: &Trigger) -> bool {
        trigger.as_http().is_some()
    }

    async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, WorkerError> {
        let kind = trigger.kind();
        let Trigger::Http(http) = trigger else {
            return Err(WorkerError::UnsupportedTrigger {
                worker: self.kind(),
                trigger: kind,
            }
            .into());
        };
        Ok(TriggerResponse::Http(self.forward(http).await?))
    }
}

/// Copies `X-Forwarded-Authorization` into `Authorization` unless the request
/// already carries an `Authorization` header.
pub fn remap_forwarded_authorization(headers: &mut MultiMap) {
    let has_authorization = headers
        .iter()
        .any(|(name, values)| name.eq_ignore_ascii_case(AUTHORIZATION) && !values.is_empty());
    if has_authorization {
        return;
    }

    let forwarded = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(FORWARDED_AUTHORIZATION))
        .map(|(_, values)| values.clone());
    if let Some(values) = forwarded.filter(|values| !values.is_empty()) {
        headers.insert(AUTHORIZATION.to_string(), values);
    }
}
