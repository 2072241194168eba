//! Serde helpers for raw payload bytes.
//!
//! Bodies travel as standard base64 strings so envelopes stay valid JSON
//! lines regardless of content type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes bytes as a base64 string.
pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Deserializes bytes from a base64 string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        #[serde(with = "super")]
        body: Vec<u8>,
    }

    #[test]
    fn body_is_base64_on_the_wire() {
        let json = serde_json::to_value(Payload {
            body: b"hello".to_vec(),
        })
        .expect("serialize");
        assert_eq!(json["body"], "aGVsbG8=");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let result: Result<Payload, _> = serde_json::from_str(r#"{"body": "***"}"#);
        assert!(result.is_err());
    }
}
