//! Pool sizing.

use serde::Deserialize;

/// Minimum and maximum live workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Workers required before triggers are served; dropping below it is a
    /// fault.
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Upper bound on registered workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_min_workers() -> usize {
    1
}

fn default_max_workers() -> usize {
    300
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
        }
    }
}

impl PoolConfig {
    /// Returns a consistent config: `max_workers` is at least 1 and at least
    /// `min_workers`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            min_workers: self.min_workers,
            max_workers: self.max_workers.max(1).max(self.min_workers),
        }
    }
}
