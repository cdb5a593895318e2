//! Peer profile and status vocabulary shared between the registries and
//! the wire protocol.

use serde::{Deserialize, Serialize};

use super::ip::IpHash;

/// Client-supplied peer profile, completed with defaults at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerProfile {
    /// Display name shown to other peers.
    pub display_name: String,
    /// Advisory collaboration role. Session creation always assigns the
    /// requester as host regardless of this value.
    pub role: RoleTag,
    /// Editor tag (e.g. `"vscode"`, `"intellij"`, `"other"`).
    pub ide: String,
}

/// Advisory collaboration role supplied at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    /// Session initiator.
    Host,
    /// Session joiner.
    Guest,
    /// Read-only participant.
    Observer,
}

impl RoleTag {
    /// Parses from a string with the registration default as fallback.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "host" => Self::Host,
            "observer" => Self::Observer,
            _ => Self::Guest,
        }
    }

    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Host => "host",
            Self::Guest => "guest",
            Self::Observer => "observer",
        }
    }
}

/// Externally observable peer status.
///
/// In this core the status only transitions through registration
/// (online) and disconnect (offline); away/busy are reserved for
/// client-driven presence updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    /// Registered and reachable.
    Online,
    /// Temporarily inactive.
    Away,
    /// Present but not accepting pairing.
    Busy,
    /// Not connected.
    Offline,
}

impl PeerStatus {
    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

/// Per-pair transport locality, derived from salted IP hashes.
/// Purely informational to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionMode {
    /// Both endpoints hash to the same source address.
    Lan,
    /// Different or unknown source addresses.
    Remote,
}

impl ConnectionMode {
    /// LAN iff both hashes are present and equal.
    pub fn between(a: &IpHash, b: &IpHash) -> Self {
        if a.matches(b) { Self::Lan } else { Self::Remote }
    }
}
