//! `AUTH` — credential verification, supersession, socket registration.

use std::sync::Arc;

use tracing::{info, warn};

use pairhub_core::traits::IdentityError;

use crate::connection::handle::ConnectionHandle;
use crate::connection::state::ConnectionPhase;
use crate::engine::RendezvousEngine;
use crate::message::codes::{CLOSE_AUTH_FAILURE, CLOSE_SUPERSEDED};
use crate::message::frames::AuthPayload;
use crate::message::{ErrorCode, ServerFrame};
use crate::registry::peer::Peer;
use crate::registry::RegistryState;

/// Handles `AUTH` on a `Connected` socket.
///
/// On success the prior connection for the same user (if any) is closed
/// and removed before the new identity is installed, so at most one live
/// peer per user is ever observable. `AUTH_SUCCESS` is only emitted
/// after that removal.
pub async fn handle_auth(
    engine: &Arc<RendezvousEngine>,
    handle: &Arc<ConnectionHandle>,
    payload: AuthPayload,
) {
    if handle.phase() != ConnectionPhase::Connected {
        handle
            .send_frame(&ServerFrame::error_with(
                ErrorCode::ValidationFailed,
                "already authenticated",
            ))
            .await;
        return;
    }

    // The only suspension points in the handler: verification and
    // membership resolution. No registry lock is held across them.
    let identity = match engine.verifier.verify(&payload.token).await {
        Ok(identity) => identity,
        Err(kind) => {
            let code = match kind {
                IdentityError::Missing => ErrorCode::TokenMissing,
                IdentityError::Expired => ErrorCode::TokenExpired,
                IdentityError::Invalid | IdentityError::Unavailable => ErrorCode::TokenInvalid,
            };
            warn!(socket_id = %handle.socket_id, code = %code, "authentication failed");
            handle
                .send_frame(&ServerFrame::AuthFailed {
                    code,
                    message: code.default_message().to_string(),
                })
                .await;
            engine
                .terminate(handle, CLOSE_AUTH_FAILURE, "authentication failed")
                .await;
            return;
        }
    };

    let network = engine.membership.active_network(&identity.user_id).await;
    if network.is_none() {
        info!(user_id = %identity.user_id, "no active network, peer will not be discoverable");
    }

    // Install under the registry lock. A watchdog or heartbeat close
    // that won the race makes this a no-op.
    let (prior_handle, removed_peer) = {
        let mut state = engine.registries.lock();
        if handle.is_closed() {
            return;
        }

        let superseded = supersede_prior(engine, &mut state, &identity.user_id);

        engine.registries.sockets.register(handle.clone());
        handle.set_authed(identity.clone(), network);
        superseded
    };

    if let Some(prior) = prior_handle {
        info!(
            user_id = %identity.user_id,
            prior_socket = %prior.socket_id,
            new_socket = %handle.socket_id,
            "prior connection superseded"
        );
        prior
            .send_farewell(
                &ServerFrame::error(ErrorCode::PeerAlreadyConnected),
                CLOSE_SUPERSEDED,
                "superseded by newer connection",
            )
            .await;
    }
    if let Some(peer) = removed_peer {
        engine
            .broadcaster
            .peer_status_update(&peer, pairhub_core::types::PeerStatus::Offline)
            .await;
    }

    info!(socket_id = %handle.socket_id, user_id = %identity.user_id, "authenticated");
    handle
        .send_frame(&ServerFrame::AuthSuccess {
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
        })
        .await;
}

/// Removes a prior live peer for the user, claiming its close gate and
/// running its registry cleanup under the already-held lock. Returns the
/// prior handle (for the farewell frames, only when this call won the
/// close gate) and the removed peer record (for the offline
/// announcement).
fn supersede_prior(
    engine: &Arc<RendezvousEngine>,
    state: &mut RegistryState,
    user_id: &pairhub_core::types::UserId,
) -> (Option<Arc<ConnectionHandle>>, Option<Peer>) {
    let Some(prior) = state.peers.lookup_by_user(user_id) else {
        return (None, None);
    };
    let prior_socket = prior.socket_id.clone();
    let prior_handle = engine.registries.sockets.get(&prior_socket);

    state.handle_user_disconnect(user_id);
    let removed_peer = state.peers.unregister_by_user(user_id);
    engine.registries.sockets.unregister(&prior_socket);

    // If the close gate was already claimed elsewhere (disconnect or
    // heartbeat racing this AUTH), that path owns the farewell; the
    // cleanup above is idempotent with it.
    let farewell = prior_handle.filter(|p| p.begin_close());
    (farewell, removed_peer)
}
