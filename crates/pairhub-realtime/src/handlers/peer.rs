//! `PEER_REGISTER` and `DISCOVER_PEERS`.

use std::sync::Arc;

use tracing::info;

use pairhub_core::types::{PeerProfile, PeerStatus, RoleTag};

use crate::connection::handle::ConnectionHandle;
use crate::engine::RendezvousEngine;
use crate::message::frames::{PeerEntry, RegisterPayload};
use crate::message::{ErrorCode, ServerFrame};

/// Handles `PEER_REGISTER` on an authed connection.
///
/// Missing profile fields default from the verified identity
/// (display name) and the registration defaults (`ide = "other"`,
/// `role = guest`). A repeat registration replaces the profile through
/// the registry's defensive path, keeping sessions intact.
pub async fn handle_register(
    engine: &Arc<RendezvousEngine>,
    handle: &Arc<ConnectionHandle>,
    payload: RegisterPayload,
) {
    let Some(identity) = handle.identity() else {
        handle.send_error(ErrorCode::NotAuthenticated).await;
        return;
    };

    let profile = PeerProfile {
        display_name: payload
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| identity.display_name.clone()),
        role: payload
            .role
            .as_deref()
            .map(RoleTag::from_str_or_default)
            .unwrap_or(RoleTag::Guest),
        ide: payload.ide.unwrap_or_else(|| "other".to_string()),
    };

    let peer = {
        let mut state = engine.registries.lock();
        if handle.is_closed() {
            return;
        }
        let peer = state.peers.register(
            identity.user_id.clone(),
            profile,
            handle.socket_id.clone(),
            handle.ip_hash.clone(),
            handle.network(),
        );
        let peer = peer.clone();
        handle.set_registered();
        peer
    };

    info!(
        socket_id = %handle.socket_id,
        user_id = %peer.user_id,
        network = peer.network_id.as_ref().map(|n| n.as_str()).unwrap_or("-"),
        "peer registered"
    );

    // Confirmation to the caller strictly precedes the announcement to
    // everyone else.
    handle
        .send_frame(&ServerFrame::PeerRegistered {
            id: peer.user_id.clone(),
            profile: peer.profile.clone(),
            status: peer.status,
        })
        .await;

    engine
        .broadcaster
        .peer_status_update(&peer, PeerStatus::Online)
        .await;
}

/// Handles `DISCOVER_PEERS` on a registered connection.
///
/// Client-side filters are ignored by design. A peer with a null
/// network sees an empty list; otherwise the list is the online peers
/// of the caller's network, minus the caller.
pub async fn handle_discover(engine: &Arc<RendezvousEngine>, handle: &Arc<ConnectionHandle>) {
    let Some(user_id) = handle.user_id() else {
        handle.send_error(ErrorCode::NotAuthenticated).await;
        return;
    };

    let Some(network) = handle.network() else {
        handle
            .send_frame(&ServerFrame::PeersList { peers: Vec::new() })
            .await;
        return;
    };

    let peers: Vec<PeerEntry> = {
        let state = engine.registries.lock();
        state
            .peers
            .online_in_network(&network)
            .into_iter()
            .filter(|p| p.user_id != user_id)
            .map(|p| PeerEntry {
                id: p.user_id.clone(),
                profile: p.profile.clone(),
                status: p.status,
                connection_mode: p.connection_mode,
            })
            .collect()
    };

    handle.send_frame(&ServerFrame::PeersList { peers }).await;
}
