//! Strongly-typed identifiers
//!
//! Every identifier is a time-ordered (v7) UUID behind its own newtype, so a
//! training run id can never be passed where a claim id is expected and ids
//! of one kind sort by creation time. The display form carries a short kind
//! prefix (`CLM-…`, `RUN-…`, `REQ-…`); the JSON form is the bare UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! time_ordered_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Display prefix for this kind of identifier
            pub const PREFIX: &'static str = $prefix;

            /// Fresh identifier, ordered after every id created before it
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// First eight hex digits, enough to tell ids apart in logs
            pub fn short(&self) -> String {
                let mut hex = self.0.simple().to_string();
                hex.truncate(8);
                format!("{}-{hex}", $prefix)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            /// Accepts `PREFIX-<uuid>` or a bare UUID
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| CoreError::invalid_identifier(stringify!($name), s, e))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

time_ordered_id!(
    /// A claim that has been scored and recorded
    ClaimId,
    "CLM"
);

time_ordered_id!(
    /// An offline training run that produced a persisted model set
    ModelRunId,
    "RUN"
);

time_ordered_id!(
    /// A single HTTP request, used to correlate log lines
    RequestId,
    "REQ"
);
