//! The worker pool.
//!
//! Holds the live workers, chooses one for each trigger, and reports when
//! the pool falls below its configured minimum. Worker processes join
//! through the [`Registrar`]; gateways call [`WorkerPool::dispatch`] or
//! [`WorkerPool::broadcast`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod registrar;

#[cfg(test)]
mod testing;

pub use config::PoolConfig;
pub use error::{PoolError, RegistrationError};
pub use pool::{WorkerFilter, WorkerPool};
pub use registrar::Registrar;
