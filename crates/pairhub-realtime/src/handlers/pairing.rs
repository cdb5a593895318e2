//! `CONNECTION_REQUEST` and `CONNECTION_RESPONSE` — the pairing
//! handshake.
//!
//! Outcomes are computed synchronously under the registry lock; the
//! resulting frames are delivered only after the lock is released.

use std::sync::Arc;

use tracing::{debug, info};

use pairhub_core::types::{NetworkId, UserId};

use crate::connection::handle::ConnectionHandle;
use crate::engine::RendezvousEngine;
use crate::message::frames::{ConnectionRequestPayload, ConnectionResponsePayload, PeerRef};
use crate::message::{ErrorCode, ServerFrame};
use crate::registry::RegistryState;

/// Frames to deliver once the registry lock is released.
type Deliveries = Vec<(Arc<ConnectionHandle>, ServerFrame)>;

/// Pairing precondition: both sides carry the same non-null network.
fn same_network(a: Option<&NetworkId>, b: Option<&NetworkId>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Handles `CONNECTION_REQUEST` on a registered connection.
///
/// The target must be a registered peer in the requester's network with
/// a live socket; nothing is ever delivered across networks.
pub async fn handle_connection_request(
    engine: &Arc<RendezvousEngine>,
    handle: &Arc<ConnectionHandle>,
    payload: ConnectionRequestPayload,
) {
    let Some(user_id) = handle.user_id() else {
        handle.send_error(ErrorCode::NotAuthenticated).await;
        return;
    };

    if payload.target_id == user_id {
        handle
            .send_frame(&ServerFrame::error_with(
                ErrorCode::ValidationFailed,
                "cannot request a connection to yourself",
            ))
            .await;
        return;
    }

    let outcome = {
        let mut state = engine.registries.lock();
        request_outcome(engine, &mut state, &user_id, &payload)
    };

    match outcome {
        Ok(deliveries) => {
            debug!(from = %user_id, to = %payload.target_id, "connection request forwarded");
            deliver(deliveries).await;
        }
        Err(code) => handle.send_error(code).await,
    }
}

/// The `CONNECTION_REQUEST` preconditions and request creation, under
/// the registry lock.
fn request_outcome(
    engine: &Arc<RendezvousEngine>,
    state: &mut RegistryState,
    user_id: &UserId,
    payload: &ConnectionRequestPayload,
) -> Result<Deliveries, ErrorCode> {
    // Unregistered between dispatch and here counts as a wrong-state
    // event.
    let requester = state
        .peers
        .lookup_by_user(user_id)
        .ok_or(ErrorCode::PeerNotRegistered)?;
    let requester_network = requester.network_id.clone();
    let requester_profile = requester.profile.clone();

    let target = state
        .peers
        .lookup_by_user(&payload.target_id)
        .ok_or(ErrorCode::PeerNotFound)?;

    if !same_network(requester_network.as_ref(), target.network_id.as_ref()) {
        return Err(ErrorCode::PeerNotInNetwork);
    }

    let target_handle = engine
        .registries
        .sockets
        .get(&target.socket_id)
        .filter(|h| !h.is_closed())
        .ok_or(ErrorCode::TargetOffline)?;

    let request_id = state
        .requests
        .create(user_id.clone(), payload.target_id.clone());

    Ok(vec![(
        target_handle,
        ServerFrame::ConnectionRequestReceived {
            request_id,
            from: PeerRef {
                id: user_id.clone(),
                profile: requester_profile,
            },
        },
    )])
}

/// Handles `CONNECTION_RESPONSE` on a registered connection.
///
/// The request must still be pending (a TTL-expired request is
/// indistinguishable from an unknown one) and addressed to the
/// responder. It is consumed regardless of the verdict.
pub async fn handle_connection_response(
    engine: &Arc<RendezvousEngine>,
    handle: &Arc<ConnectionHandle>,
    payload: ConnectionResponsePayload,
) {
    let Some(responder_id) = handle.user_id() else {
        handle.send_error(ErrorCode::NotAuthenticated).await;
        return;
    };

    let outcome = {
        let mut state = engine.registries.lock();
        response_outcome(engine, &mut state, handle, &responder_id, &payload)
    };

    match outcome {
        Ok(deliveries) => deliver(deliveries).await,
        Err(code) => handle.send_error(code).await,
    }
}

/// The `CONNECTION_RESPONSE` validation, request consumption, and
/// session creation, under the registry lock.
fn response_outcome(
    engine: &Arc<RendezvousEngine>,
    state: &mut RegistryState,
    handle: &Arc<ConnectionHandle>,
    responder_id: &UserId,
    payload: &ConnectionResponsePayload,
) -> Result<Deliveries, ErrorCode> {
    let request = state
        .requests
        .get(&payload.request_id)
        .ok_or(ErrorCode::RequestNotFound)?;
    if request.to_user_id != *responder_id {
        return Err(ErrorCode::RequestUnauthorized);
    }

    // Consumed from here on, whatever the verdict.
    let request = state
        .requests
        .remove(&payload.request_id)
        .ok_or(ErrorCode::RequestNotFound)?;
    let requester_id = request.from_user_id;

    let requester = state
        .peers
        .lookup_by_user(&requester_id)
        .ok_or(ErrorCode::PeerNotFound)?;
    let requester_socket = requester.socket_id.clone();
    let requester_profile = requester.profile.clone();
    let requester_handle = engine
        .registries
        .sockets
        .get(&requester_socket)
        .ok_or(ErrorCode::PeerNotFound)?;

    if !payload.accepted {
        info!(request_id = %payload.request_id, responder = %responder_id, "request rejected");
        return Ok(vec![(
            requester_handle,
            ServerFrame::ConnectionRejected {
                request_id: payload.request_id.clone(),
                target_id: responder_id.clone(),
            },
        )]);
    }

    let responder_peer = state
        .peers
        .lookup_by_user(responder_id)
        .ok_or(ErrorCode::PeerNotRegistered)?;
    let responder_socket = responder_peer.socket_id.clone();
    let responder_profile = responder_peer.profile.clone();

    let session_id = {
        let RegistryState { peers, sessions, .. } = state;
        sessions.create_for_pair(
            peers,
            &requester_id,
            &requester_socket,
            responder_id,
            &responder_socket,
        )
    };

    info!(
        request_id = %payload.request_id,
        session_id = %session_id,
        host = %requester_id,
        guest = %responder_id,
        "request accepted, session created"
    );

    Ok(vec![
        (
            requester_handle,
            ServerFrame::ConnectionAccepted {
                request_id: payload.request_id.clone(),
                session_id: session_id.clone(),
                peer: PeerRef {
                    id: responder_id.clone(),
                    profile: responder_profile,
                },
            },
        ),
        (
            handle.clone(),
            ServerFrame::SessionCreated {
                session_id,
                peer: PeerRef {
                    id: requester_id,
                    profile: requester_profile,
                },
            },
        ),
    ])
}

/// Sequentially delivers computed frames.
async fn deliver(deliveries: Deliveries) {
    for (recipient, frame) in deliveries {
        recipient.send_frame(&frame).await;
    }
}
