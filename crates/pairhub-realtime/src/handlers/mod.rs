//! Event handlers for the rendezvous protocol.

pub mod auth;
pub mod messaging;
pub mod pairing;
pub mod peer;

use std::sync::Arc;

use crate::connection::handle::ConnectionHandle;
use crate::connection::state::ConnectionPhase;
use crate::engine::RendezvousEngine;
use crate::message::ServerFrame;

/// `PING` — accepted in every phase. Marks the connection alive, stamps
/// peer activity when registered, and replies with a monotonic
/// millisecond timestamp.
pub async fn handle_ping(engine: &Arc<RendezvousEngine>, handle: &Arc<ConnectionHandle>) {
    handle.set_alive(true);

    if handle.phase() == ConnectionPhase::Registered {
        if let Some(user_id) = handle.user_id() {
            engine.registries.lock().peers.update_activity(&user_id);
        }
    }

    handle
        .send_frame(&ServerFrame::Pong {
            timestamp: engine.monotonic_ms(),
        })
        .await;
}
