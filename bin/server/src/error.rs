//! Domain error types for the server.
//!
//! Most variants wrap lower-level reports via `.context()`.

use std::fmt;

/// Errors that stop the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The worker listener could not be bound.
    Bind { address: String, message: String },
    /// The HTTP forwarding worker could not be set up.
    HttpForward { address: String },
    /// Not enough workers registered before the startup deadline.
    WorkersUnavailable,
    /// The pool reported a fault while serving.
    PoolFault { reason: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { address, message } => {
                write!(f, "failed to bind worker listener on {address}: {message}")
            }
            Self::HttpForward { address } => {
                write!(f, "failed to set up http forwarding to {address}")
            }
            Self::WorkersUnavailable => {
                write!(f, "worker pool did not reach its minimum size")
            }
            Self::PoolFault { reason } => write!(f, "worker pool fault: {reason}"),
        }
    }
}

impl std::error::Error for ServerError {}
