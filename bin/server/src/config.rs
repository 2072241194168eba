//! Centralized server configuration.
//!
//! Loaded via the `config` crate from unprefixed environment variables
//! (`SERVICE_ADDRESS`, `MIN_WORKERS`, ...). Every setting has a default.

use membrane_pool::PoolConfig;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address worker processes connect to.
    #[serde(default = "default_service_address")]
    pub service_address: String,

    /// Address of the local HTTP server used for HTTP forwarding.
    #[serde(default = "default_child_address")]
    pub child_address: String,

    /// Workers required before the server reports ready.
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Upper bound on registered workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// How long to wait for the minimum workers at startup, in seconds.
    #[serde(default = "default_child_timeout_seconds")]
    pub child_timeout_seconds: u64,

    /// Register a worker that forwards HTTP triggers to `child_address`.
    #[serde(default)]
    pub http_forward: bool,

    /// Wrap workers in tracing spans.
    #[serde(default)]
    pub instrument_workers: bool,
}

fn default_service_address() -> String {
    "127.0.0.1:50051".to_string()
}

fn default_child_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_min_workers() -> usize {
    1
}

fn default_max_workers() -> usize {
    300
}

fn default_child_timeout_seconds() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_address: default_service_address(),
            child_address: default_child_address(),
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            child_timeout_seconds: default_child_timeout_seconds(),
            http_forward: false,
            instrument_workers: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Pool sizing, with the maximum lifted to at least the minimum.
    #[must_use]
    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            min_workers: self.min_workers,
            max_workers: self.max_workers,
        }
        .normalized()
    }

    /// Startup deadline for the minimum worker count.
    #[must_use]
    pub fn child_timeout(&self) -> Duration {
        Duration::from_secs(self.child_timeout_seconds)
    }
}
