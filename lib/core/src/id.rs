//! Strongly-typed identifiers.
//!
//! Ids are ULIDs wrapped in a newtype per entity. They render with a short
//! prefix (`tkt_01H...`) and parse from either the prefixed or the bare ULID
//! form, since worker processes echo ticket ids back verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when an id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The id type that failed to parse.
    pub id_type: &'static str,
    /// Why parsing failed.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Generates a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Wraps an existing ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the wrapped ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Display prefix for this id type.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(concat!($prefix, "_"))
                    .unwrap_or(s);

                Ulid::from_str(raw).map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }
    };
}

define_id!(
    /// Correlation id for one in-flight call over a worker stream.
    TicketId,
    "tkt"
);

define_id!(
    /// Identity of a registered worker inside a pool.
    WorkerId,
    "wkr"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ticket_id_display_is_prefixed() {
        assert!(TicketId::new().to_string().starts_with("tkt_"));
        assert!(WorkerId::new().to_string().starts_with("wkr_"));
    }

    #[test]
    fn parses_prefixed_and_bare_forms() {
        let id = TicketId::new();
        let prefixed: TicketId = id.to_string().parse().expect("prefixed");
        let bare: TicketId = id.as_ulid().to_string().parse().expect("bare");
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "definitely-not-a-ticket".parse::<TicketId>().unwrap_err();
        assert_eq!(err.id_type, "TicketId");
        assert!(err.to_string().starts_with("invalid TicketId"));
    }

    #[test]
    fn fresh_ids_are_unique() {
        let ids: HashSet<TicketId> = (0..256).map(|_| TicketId::new()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn serializes_as_bare_ulid() {
        let id = WorkerId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
    }
}
