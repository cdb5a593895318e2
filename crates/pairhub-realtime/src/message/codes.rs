//! Stable protocol error codes and application close codes.
//!
//! Codes are part of the public protocol contract; clients match on them.
//! Never renumber or reuse a code.

use serde::{Deserialize, Serialize};

/// Application-level WebSocket close code: authentication timeout/failure.
pub const CLOSE_AUTH_FAILURE: u16 = 4001;
/// Application-level WebSocket close code: superseded by a newer connection.
pub const CLOSE_SUPERSEDED: u16 = 4002;

/// Stable error code carried in `ERROR` and `AUTH_FAILED` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No credential was presented within the authentication window.
    #[serde(rename = "ERR_1001")]
    TokenMissing,
    /// The credential failed verification.
    #[serde(rename = "ERR_1002")]
    TokenInvalid,
    /// The credential has expired.
    #[serde(rename = "ERR_1003")]
    TokenExpired,
    /// No peer is registered under the given user id.
    #[serde(rename = "ERR_2001")]
    PeerNotFound,
    /// The user already has a live connection.
    #[serde(rename = "ERR_2005")]
    PeerAlreadyConnected,
    /// The operation requires prior peer registration.
    #[serde(rename = "ERR_2006")]
    PeerNotRegistered,
    /// Requester and target are not in the same network.
    #[serde(rename = "ERR_2007")]
    PeerNotInNetwork,
    /// No session exists under the given session id.
    #[serde(rename = "ERR_3001")]
    SessionNotFound,
    /// The sender is not a participant of the session.
    #[serde(rename = "ERR_3008")]
    NotAParticipant,
    /// The target peer's socket is not open.
    #[serde(rename = "ERR_4003")]
    TargetOffline,
    /// The frame could not be parsed or names an unknown event.
    #[serde(rename = "ERR_5003")]
    InvalidMessage,
    /// The operation requires an authenticated connection.
    #[serde(rename = "ERR_5005")]
    NotAuthenticated,
    /// No pending request exists under the given request id.
    #[serde(rename = "ERR_6001")]
    RequestNotFound,
    /// The responder is not the request's addressee.
    #[serde(rename = "ERR_6004")]
    RequestUnauthorized,
    /// The payload failed validation.
    #[serde(rename = "ERR_9003")]
    ValidationFailed,
}

impl ErrorCode {
    /// The wire rendering of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenMissing => "ERR_1001",
            Self::TokenInvalid => "ERR_1002",
            Self::TokenExpired => "ERR_1003",
            Self::PeerNotFound => "ERR_2001",
            Self::PeerAlreadyConnected => "ERR_2005",
            Self::PeerNotRegistered => "ERR_2006",
            Self::PeerNotInNetwork => "ERR_2007",
            Self::SessionNotFound => "ERR_3001",
            Self::NotAParticipant => "ERR_3008",
            Self::TargetOffline => "ERR_4003",
            Self::InvalidMessage => "ERR_5003",
            Self::NotAuthenticated => "ERR_5005",
            Self::RequestNotFound => "ERR_6001",
            Self::RequestUnauthorized => "ERR_6004",
            Self::ValidationFailed => "ERR_9003",
        }
    }

    /// Default human-readable message for the code.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::TokenMissing => "authentication token missing",
            Self::TokenInvalid => "authentication token invalid",
            Self::TokenExpired => "authentication token expired",
            Self::PeerNotFound => "peer not found",
            Self::PeerAlreadyConnected => "peer already connected",
            Self::PeerNotRegistered => "peer must register first",
            Self::PeerNotInNetwork => "peer not in same network",
            Self::SessionNotFound => "session not found",
            Self::NotAParticipant => "not a participant of this session",
            Self::TargetOffline => "target peer is offline",
            Self::InvalidMessage => "invalid message",
            Self::NotAuthenticated => "socket not authenticated",
            Self::RequestNotFound => "connection request not found",
            Self::RequestUnauthorized => "connection request not addressed to caller",
            Self::ValidationFailed => "validation failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
