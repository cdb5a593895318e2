//! `SEND_MESSAGE` — best-effort fire-and-forget routing within a
//! session.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use pairhub_core::types::UserId;

use crate::connection::handle::ConnectionHandle;
use crate::engine::RendezvousEngine;
use crate::message::frames::SendMessagePayload;
use crate::message::{ErrorCode, ServerFrame};
use crate::registry::RegistryState;

/// Handles `SEND_MESSAGE` on a registered connection.
///
/// The frame is forwarded once to every other participant whose socket
/// is currently open. No acknowledgement, no persistence, no redelivery
/// on a transient socket error.
pub async fn handle_send_message(
    engine: &Arc<RendezvousEngine>,
    handle: &Arc<ConnectionHandle>,
    payload: SendMessagePayload,
) {
    let Some(sender_id) = handle.user_id() else {
        handle.send_error(ErrorCode::NotAuthenticated).await;
        return;
    };

    let outcome = {
        let mut state = engine.registries.lock();
        routing_outcome(engine, &mut state, &sender_id, &payload)
    };

    let recipients = match outcome {
        Ok(recipients) => recipients,
        Err(code) => {
            handle.send_error(code).await;
            return;
        }
    };

    let frame = ServerFrame::MessageReceived {
        session_id: payload.session_id.clone(),
        from: sender_id,
        content: payload.content,
        kind: payload.kind,
        correlation_id: payload.correlation_id,
        timestamp: Utc::now(),
    };

    debug!(
        session_id = %payload.session_id,
        recipients = recipients.len(),
        "message routed"
    );

    for recipient in recipients {
        recipient.send_frame(&frame).await;
    }
}

/// Validates the session membership and stamps activity, under the
/// registry lock. Returns the open recipient sockets.
fn routing_outcome(
    engine: &Arc<RendezvousEngine>,
    state: &mut RegistryState,
    sender_id: &UserId,
    payload: &SendMessagePayload,
) -> Result<Vec<Arc<ConnectionHandle>>, ErrorCode> {
    let session = state
        .sessions
        .get(&payload.session_id)
        .ok_or(ErrorCode::SessionNotFound)?;

    if !session.participants.contains_key(sender_id) {
        return Err(ErrorCode::NotAParticipant);
    }

    let recipients = session
        .participants
        .values()
        .filter(|p| p.user_id != *sender_id)
        .filter_map(|p| engine.registries.sockets.get(&p.socket_id))
        .filter(|h| !h.is_closed())
        .collect();

    state.sessions.update_activity(&payload.session_id, sender_id);
    state.peers.update_activity(sender_id);

    Ok(recipients)
}
