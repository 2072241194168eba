//! Messages exchanged over a worker stream.
//!
//! Every message carries a correlation id and exactly one content case. The
//! membrane sends [`ServerMessage`]s; worker processes send
//! [`ClientMessage`]s. Trigger responses echo the id of the request they
//! answer; handshake messages use an empty id.

use crate::registration::WorkerRegistration;
use crate::response::TriggerResponse;
use crate::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// Handshake opened by a worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    /// The triggers the worker wants to receive.
    pub registration: WorkerRegistration,
}

/// Handshake acknowledgement sent by the membrane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    /// Set when the registration was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Content of a membrane-to-worker message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerContent {
    /// Handshake acknowledgement.
    InitResponse(InitResponse),
    /// A trigger to handle.
    TriggerRequest(Trigger),
}

/// A membrane-to-worker message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Correlation id.
    #[serde(default)]
    pub id: String,
    /// Message content.
    pub content: ServerContent,
}

impl ServerMessage {
    /// Wraps a trigger for delivery under the given correlation id.
    #[must_use]
    pub fn trigger_request(id: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            id: id.into(),
            content: ServerContent::TriggerRequest(trigger),
        }
    }

    /// Builds a handshake acknowledgement.
    #[must_use]
    pub fn init_response(id: impl Into<String>, error: Option<String>) -> Self {
        Self {
            id: id.into(),
            content: ServerContent::InitResponse(InitResponse { error }),
        }
    }
}

/// Content of a worker-to-membrane message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientContent {
    /// Handshake request.
    InitRequest(InitRequest),
    /// Answer to a trigger request.
    TriggerResponse(TriggerResponse),
}

/// A worker-to-membrane message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Correlation id.
    #[serde(default)]
    pub id: String,
    /// Message content.
    pub content: ClientContent,
}

impl ClientMessage {
    /// Builds the opening handshake for a registration.
    #[must_use]
    pub fn init(registration: WorkerRegistration) -> Self {
        Self {
            id: String::new(),
            content: ClientContent::InitRequest(InitRequest { registration }),
        }
    }

    /// Builds the answer to the request with the given id.
    #[must_use]
    pub fn response(id: impl Into<String>, response: TriggerResponse) -> Self {
        Self {
            id: id.into(),
            content: ClientContent::TriggerResponse(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_request_json_shape() {
        let message = ServerMessage::trigger_request("tkt_1", Trigger::topic("orders", Vec::new()));
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["id"], "tkt_1");
        assert_eq!(json["content"]["trigger_request"]["kind"], "topic");
        assert_eq!(json["content"]["trigger_request"]["topic"], "orders");
    }

    #[test]
    fn accepted_init_response_omits_error() {
        let json =
            serde_json::to_value(ServerMessage::init_response("", None)).expect("serialize");
        assert_eq!(json["content"], serde_json::json!({"init_response": {}}));
    }

    #[test]
    fn client_handshake_parses_without_id() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"content": {"init_request": {"registration": {"kind": "subscription", "topic": "orders"}}}}"#,
        )
        .expect("deserialize");
        assert_eq!(message.id, "");
        assert_eq!(
            message.content,
            ClientContent::InitRequest(InitRequest {
                registration: WorkerRegistration::Subscription {
                    topic: "orders".to_string()
                }
            })
        );
    }
}
