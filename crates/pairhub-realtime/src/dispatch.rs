//! Protocol dispatcher — parses inbound frames, authorizes them against
//! the connection phase, and routes them to handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::connection::handle::ConnectionHandle;
use crate::connection::state::ConnectionPhase;
use crate::engine::RendezvousEngine;
use crate::handlers;
use crate::message::frames::RawFrame;
use crate::message::{ErrorCode, ServerFrame};

/// Handles one inbound text frame.
///
/// Any received application frame counts as liveness. Parse failures and
/// unknown events are non-fatal; the connection stays open.
pub async fn dispatch(engine: &Arc<RendezvousEngine>, handle: &Arc<ConnectionHandle>, raw: &str) {
    handle.set_alive(true);

    let frame: RawFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(socket_id = %handle.socket_id, error = %e, "unparseable frame");
            handle.send_error(ErrorCode::InvalidMessage).await;
            return;
        }
    };

    let phase = handle.phase();

    match frame.event.as_str() {
        "AUTH" => match parse(frame.data) {
            Ok(payload) => handlers::auth::handle_auth(engine, handle, payload).await,
            Err(code) => handle.send_error(code).await,
        },
        "PING" => handlers::handle_ping(engine, handle).await,
        "PEER_REGISTER" => {
            if phase < ConnectionPhase::Authed {
                handle.send_error(ErrorCode::NotAuthenticated).await;
                return;
            }
            match parse(frame.data) {
                Ok(payload) => handlers::peer::handle_register(engine, handle, payload).await,
                Err(code) => handle.send_error(code).await,
            }
        }
        "DISCOVER_PEERS" => {
            if let Some(code) = require_registered(phase) {
                handle.send_error(code).await;
                return;
            }
            // Client-side filters are deliberately ignored; the payload
            // is not even parsed.
            handlers::peer::handle_discover(engine, handle).await;
        }
        "CONNECTION_REQUEST" => {
            if let Some(code) = require_registered(phase) {
                handle.send_error(code).await;
                return;
            }
            match parse(frame.data) {
                Ok(payload) => {
                    handlers::pairing::handle_connection_request(engine, handle, payload).await
                }
                Err(code) => handle.send_error(code).await,
            }
        }
        "CONNECTION_RESPONSE" => {
            if let Some(code) = require_registered(phase) {
                handle.send_error(code).await;
                return;
            }
            match parse(frame.data) {
                Ok(payload) => {
                    handlers::pairing::handle_connection_response(engine, handle, payload).await
                }
                Err(code) => handle.send_error(code).await,
            }
        }
        "SEND_MESSAGE" => {
            if let Some(code) = require_registered(phase) {
                handle.send_error(code).await;
                return;
            }
            match parse(frame.data) {
                Ok(payload) => {
                    handlers::messaging::handle_send_message(engine, handle, payload).await
                }
                Err(code) => handle.send_error(code).await,
            }
        }
        unknown => {
            debug!(socket_id = %handle.socket_id, event = %unknown, "unknown event");
            handle
                .send_frame(&ServerFrame::error_with(
                    ErrorCode::InvalidMessage,
                    format!("unknown event: {unknown}"),
                ))
                .await;
        }
    }
}

/// Minimum-phase check for registered-only events.
fn require_registered(phase: ConnectionPhase) -> Option<ErrorCode> {
    match phase {
        ConnectionPhase::Connected => Some(ErrorCode::NotAuthenticated),
        ConnectionPhase::Authed => Some(ErrorCode::PeerNotRegistered),
        ConnectionPhase::Registered => None,
    }
}

/// Deserializes an event payload; shape errors are validation failures.
/// An absent `data` member is treated as an empty object so that
/// payloads whose fields are all optional parse to their defaults.
fn parse<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, ErrorCode> {
    let data = if data.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|_| ErrorCode::ValidationFailed)
}
