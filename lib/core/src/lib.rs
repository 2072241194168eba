//! Core types shared by every membrane crate.
//!
//! The membrane sits between trigger gateways (HTTP, topics, schedules,
//! bucket notifications, websockets) and the long-lived worker processes
//! that handle them. This crate holds only what every layer needs: the
//! rootcause-backed `Result` alias and strongly-typed identifiers.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, TicketId, WorkerId};
