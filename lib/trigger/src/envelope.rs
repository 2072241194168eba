//! Versioned framing for stream messages.
//!
//! Each message on a line-oriented worker stream is one JSON object
//! `{"version": 1, "payload": {...}}`. The version is checked before the
//! payload is decoded so an incompatible worker fails with a clear error
//! instead of a confusing field mismatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The envelope version this build speaks.
pub const CURRENT_VERSION: u32 = 1;

/// Errors from encoding or decoding an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The bytes were not a valid envelope or payload.
    Malformed { message: String },
    /// The peer speaks a different envelope version.
    UnsupportedVersion { version: u32 },
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { message } => write!(f, "malformed envelope: {message}"),
            Self::UnsupportedVersion { version } => write!(
                f,
                "unsupported envelope version {version} (expected {CURRENT_VERSION})"
            ),
        }
    }
}

impl std::error::Error for EnvelopeError {}

impl From<serde_json::Error> for EnvelopeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed {
            message: e.to_string(),
        }
    }
}

/// A versioned wrapper around a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Envelope format version.
    pub version: u32,
    /// The wrapped message.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps a payload at the current version.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            version: CURRENT_VERSION,
            payload,
        }
    }

    /// Unwraps the payload.
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encodes the envelope as a single JSON line, newline included.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_json_line(&self) -> Result<String, EnvelopeError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl<T: for<'de> Deserialize<'de>> Envelope<T> {
    /// Decodes one JSON line, rejecting other envelope versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is malformed or the version differs.
    pub fn from_json_line(line: &str) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_str(line.trim_end())?;
        if raw.version != CURRENT_VERSION {
            return Err(EnvelopeError::UnsupportedVersion {
                version: raw.version,
            });
        }
        raw.deserialize_payload()
    }
}

/// An envelope whose payload has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Envelope format version.
    pub version: u32,
    /// Undecoded payload.
    pub payload: serde_json::Value,
}

impl RawEnvelope {
    /// Decodes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn deserialize_payload<T: for<'de> Deserialize<'de>>(
        self,
    ) -> Result<Envelope<T>, EnvelopeError> {
        let payload = serde_json::from_value(self.payload)?;
        Ok(Envelope {
            version: self.version,
            payload,
        })
    }
}
