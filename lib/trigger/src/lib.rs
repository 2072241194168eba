//! Trigger model and worker stream protocol.
//!
//! This crate defines what flows through the membrane:
//!
//! - **Triggers**: normalized inbound events (HTTP, topic, bucket
//!   notification, websocket) produced by gateways
//! - **Responses**: the kind-specific result a worker hands back
//! - **Registrations**: what a worker process declares it can handle
//! - **Messages**: the bidirectional stream contract between the membrane
//!   and a worker process, framed in versioned envelopes

pub mod body;
pub mod envelope;
pub mod message;
pub mod registration;
pub mod response;
pub mod trigger;

pub use envelope::{Envelope, EnvelopeError, RawEnvelope};
pub use message::{
    ClientContent, ClientMessage, InitRequest, InitResponse, ServerContent, ServerMessage,
};
pub use registration::{NotificationTarget, WILDCARD_PREFIX, WorkerRegistration, normalize_name};
pub use response::{HttpResponse, TriggerResponse};
pub use trigger::{
    BucketEventType, HttpTrigger, MultiMap, NotificationTrigger, TopicTrigger, Trigger,
    TriggerKind, WebsocketEvent, WebsocketTrigger,
};
