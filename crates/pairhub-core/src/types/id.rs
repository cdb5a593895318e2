//! Typed identifiers for all domain entities.
//!
//! Server-minted identifiers are prefixed strings (`sock_<uuid>`,
//! `ses_<uuid>`, `req_<base36-millis>_<suffix>`) so that an id is
//! self-describing in logs and on the wire. `UserId` and `NetworkId` are
//! opaque: their values come from the identity provider and the
//! membership store respectively and are never minted here.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define an opaque string identifier owned by an external system.
macro_rules! define_opaque_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier value.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

/// Macro to define a server-minted identifier with a fixed prefix over a
/// random UUID v4.
macro_rules! define_prefixed_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        define_opaque_id!(
            $(#[$meta])*
            $name
        );

        impl $name {
            /// Mint a new random identifier.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4()))
            }
        }
    };
}

define_opaque_id!(
    /// Opaque user identifier issued by the identity provider.
    /// Stable across connections and sessions.
    UserId
);

define_opaque_id!(
    /// Opaque invite-code network identifier from the membership store.
    NetworkId
);

define_prefixed_id!(
    /// Unique identifier for a live socket connection.
    SocketId,
    "sock"
);

define_prefixed_id!(
    /// Unique identifier for a pairwise session.
    SessionId,
    "ses"
);

define_opaque_id!(
    /// Unique identifier for a pending connection request.
    RequestId
);

impl RequestId {
    /// Mint a new request identifier: `req_<base36 unix-millis>_<suffix>`.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u128;
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        Self(format!("req_{}_{}", to_base36(millis), suffix))
    }
}

/// Lowercase base36 rendering of an unsigned integer.
fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while n > 0 {
        let digit = (n % 36) as u32;
        out.insert(0, char::from_digit(digit, 36).unwrap_or('0'));
        n /= 36;
    }
    out
}
