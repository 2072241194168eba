//! membrane server.
//!
//! Accepts worker process connections, registers them in the worker pool,
//! and keeps the pool supervised. Gateways embed the pool via
//! [`Server::pool`].

pub mod config;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::Server;
