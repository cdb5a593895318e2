//! Salted IP hashing.
//!
//! Raw client addresses are never stored anywhere in the system; every
//! connection carries only a salted SHA-256 hash of its source address,
//! rendered as fixed-length lowercase hex. Equality of two hashes is the
//! only operation ever performed on them (LAN-mode detection).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Salted hash of a client source address.
///
/// An empty hash means the address could not be determined; it never
/// matches anything, including another empty hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpHash(String);

impl IpHash {
    /// Hash a source address under the configured salt.
    pub fn from_addr(addr: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(addr.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// An absent hash for connections with no determinable address.
    pub fn unknown() -> Self {
        Self(String::new())
    }

    /// Whether the hash is absent.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The hex rendering.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff both hashes are present and equal.
    pub fn matches(&self, other: &IpHash) -> bool {
        !self.is_empty() && self == other
    }
}

impl fmt::Display for IpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
