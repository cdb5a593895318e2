//! Wire frame definitions.
//!
//! Every frame is a UTF-8 JSON object `{ "event": <string>, "data":
//! <object?> }`. Event names are SCREAMING_SNAKE_CASE; payload fields are
//! camelCase. Inbound frames are parsed in two steps (raw envelope, then
//! per-event payload) so that unknown events and malformed payloads can
//! be reported precisely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pairhub_core::types::{
    ConnectionMode, PeerProfile, PeerStatus, RequestId, SessionId, UserId,
};

use super::codes::ErrorCode;

/// Raw inbound envelope, parsed before the event is known.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    /// Event name.
    pub event: String,
    /// Event payload; defaults to null for payload-free events.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `AUTH` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    /// Bearer credential.
    #[serde(default)]
    pub token: String,
}

/// `PEER_REGISTER` payload. All fields optional; defaults come from the
/// verified identity and the registration defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// Display name override.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Editor tag.
    #[serde(default)]
    pub ide: Option<String>,
    /// Advisory role.
    #[serde(default)]
    pub role: Option<String>,
}

/// `CONNECTION_REQUEST` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestPayload {
    /// The user to pair with.
    pub target_id: UserId,
}

/// `CONNECTION_RESPONSE` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponsePayload {
    /// The request being answered.
    pub request_id: RequestId,
    /// Whether the request was accepted.
    pub accepted: bool,
}

/// `SEND_MESSAGE` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Target session.
    pub session_id: SessionId,
    /// Application-defined message body.
    pub content: serde_json::Value,
    /// Optional application-defined message type.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Optional client correlation id, echoed to recipients.
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// Peer summary used in `from`/`peer` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRef {
    /// User id.
    pub id: UserId,
    /// Profile at the time of emission.
    pub profile: PeerProfile,
}

/// Entry in a `PEERS_LIST` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerEntry {
    /// User id.
    pub id: UserId,
    /// Profile.
    pub profile: PeerProfile,
    /// Current status.
    pub status: PeerStatus,
    /// Transport locality stored on the peer record.
    pub connection_mode: ConnectionMode,
}

/// Server-to-client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerFrame {
    /// Authentication succeeded.
    AuthSuccess {
        user_id: UserId,
        display_name: String,
        email: String,
    },
    /// Authentication failed; the socket closes with 4001 afterwards.
    AuthFailed { code: ErrorCode, message: String },
    /// Registration confirmed to the caller.
    PeerRegistered {
        id: UserId,
        profile: PeerProfile,
        status: PeerStatus,
    },
    /// Another peer's status changed. `connection_mode` is computed per
    /// recipient at emission time.
    PeerStatusUpdate {
        id: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        profile: Option<PeerProfile>,
        status: PeerStatus,
        connection_mode: ConnectionMode,
    },
    /// Discovery result: online peers in the caller's network.
    PeersList { peers: Vec<PeerEntry> },
    /// A pairing request addressed to this peer.
    ConnectionRequestReceived { request_id: RequestId, from: PeerRef },
    /// The addressee accepted; a session now exists.
    ConnectionAccepted {
        request_id: RequestId,
        session_id: SessionId,
        peer: PeerRef,
    },
    /// The addressee declined.
    ConnectionRejected {
        request_id: RequestId,
        target_id: UserId,
    },
    /// Session created, delivered to the accepting side.
    SessionCreated { session_id: SessionId, peer: PeerRef },
    /// Routed application message.
    MessageReceived {
        session_id: SessionId,
        from: UserId,
        content: serde_json::Value,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Liveness reply; timestamp is server-monotonic milliseconds.
    Pong { timestamp: u64 },
    /// Non-fatal protocol error.
    Error { code: ErrorCode, message: String },
}

impl ServerFrame {
    /// Builds an `ERROR` frame with the code's default message.
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            code,
            message: code.default_message().to_string(),
        }
    }

    /// Builds an `ERROR` frame with a specific message.
    pub fn error_with(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
