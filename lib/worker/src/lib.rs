//! Workers and the stream plumbing behind them.
//!
//! A worker is a registered handler for a subset of triggers. Most workers
//! stand in for a remote worker process and forward through a
//! [`CorrelationAdapter`], which multiplexes concurrent calls over one
//! bidirectional message stream:
//!
//! - [`stream`]: the sink/source seam, with [`channel`] (in-process) and
//!   [`lines`] (JSON lines over any async byte stream) transports
//! - [`adapter`]: ticket-based request/response correlation
//! - [`worker`]: the [`Worker`] trait and the variants that implement it
//! - [`factory`]: builds a worker from a process's registration

pub mod adapter;
pub mod catch_all;
pub mod channel;
pub mod error;
pub mod factory;
pub mod instrumented;
pub mod lines;
pub mod local_http;
pub mod notification;
pub mod path;
pub mod route;
pub mod stream;
pub mod topic;
pub mod websocket;
pub mod worker;

pub use adapter::{Adapter, CorrelationAdapter};
pub use catch_all::CatchAllWorker;
pub use error::{AdapterError, NotificationOverlap, PathTemplateMismatch, StreamError, WorkerError};
pub use factory::build_worker;
pub use instrumented::InstrumentedWorker;
pub use lines::{LineSink, LineSource};
pub use local_http::LocalHttpWorker;
pub use notification::{BucketNotificationWorker, validate_bucket_notifications};
pub use path::extract_path_params;
pub use route::RouteWorker;
pub use stream::{MessageSink, MessageSource};
pub use topic::{ScheduleWorker, SubscriptionWorker};
pub use websocket::WebsocketWorker;
pub use worker::{Worker, WorkerKind};
