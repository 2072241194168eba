//! Error types for the pool crate.
//!
//! - `PoolError`: pool operations and the faults reported by `monitor`
//! - `RegistrationError`: failures while a worker process registers

use membrane_core::WorkerId;
use membrane_trigger::TriggerKind;
use std::fmt;
use std::time::Duration;

/// Errors from worker pool operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No registered worker accepts the trigger.
    NoMatchingWorker { kind: TriggerKind },
    /// The pool already holds its maximum number of workers.
    CapacityReached { max: usize },
    /// A bucket notification registration overlaps an existing one.
    OverlappingNotifications {
        bucket: String,
        existing_prefix: String,
        new_prefix: String,
    },
    /// The worker was never added, or was already removed.
    WorkerNotRegistered { worker_id: WorkerId },
    /// The live worker count dropped below the minimum.
    InsufficientWorkers { live: usize, min: usize },
    /// The minimum worker count was not reached in time.
    MinimumWorkersTimeout {
        live: usize,
        min: usize,
        timeout: Duration,
    },
}

impl PoolError {
    /// Returns true for errors that reject a worker's registration.
    #[must_use]
    pub fn is_registration_rejection(&self) -> bool {
        matches!(
            self,
            Self::CapacityReached { .. } | Self::OverlappingNotifications { .. }
        )
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingWorker { kind } => {
                write!(f, "no worker available to handle {kind} trigger")
            }
            Self::CapacityReached { max } => {
                write!(f, "worker pool is at capacity ({max} workers)")
            }
            Self::OverlappingNotifications {
                bucket,
                existing_prefix,
                new_prefix,
            } => write!(
                f,
                "bucket '{bucket}' notification prefix '{new_prefix}' overlaps existing prefix '{existing_prefix}'"
            ),
            Self::WorkerNotRegistered { worker_id } => {
                write!(f, "worker {worker_id} is not registered")
            }
            Self::InsufficientWorkers { live, min } => {
                write!(f, "insufficient workers: {live} live, {min} required")
            }
            Self::MinimumWorkersTimeout { live, min, timeout } => write!(
                f,
                "timed out after {timeout:?} waiting for {min} workers ({live} live)"
            ),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<membrane_worker::NotificationOverlap> for PoolError {
    fn from(overlap: membrane_worker::NotificationOverlap) -> Self {
        Self::OverlappingNotifications {
            bucket: overlap.bucket,
            existing_prefix: overlap.existing_prefix,
            new_prefix: overlap.new_prefix,
        }
    }
}

/// Errors from the registration handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The stream closed before the worker sent its registration.
    ClosedBeforeHandshake,
    /// The first message was not a registration.
    HandshakeExpected,
    /// The stream failed during the handshake.
    Stream { message: String },
    /// The pool refused the worker.
    Rejected { reason: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedBeforeHandshake => {
                write!(f, "worker stream closed before registration")
            }
            Self::HandshakeExpected => {
                write!(f, "expected an init request as the first message")
            }
            Self::Stream { message } => write!(f, "registration stream failed: {message}"),
            Self::Rejected { reason } => write!(f, "registration rejected: {reason}"),
        }
    }
}

impl std::error::Error for RegistrationError {}
