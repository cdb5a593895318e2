//! Broadcast engine — derives recipient sets from the registries at
//! emission time and fans frames out.
//!
//! Recipient sets are snapshotted under the registry lock in peer
//! registration order, then the lock is released before any socket
//! write. Per-recipient ordering is preserved by each handle's outbound
//! channel.

use std::sync::Arc;

use pairhub_core::types::{ConnectionMode, PeerStatus};

use crate::connection::handle::ConnectionHandle;
use crate::message::ServerFrame;
use crate::registry::peer::Peer;
use crate::registry::Registries;

/// Fans frames out to recipient sets computed against the registries.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registries: Arc<Registries>,
}

impl Broadcaster {
    /// Creates a broadcaster over the shared registries.
    pub fn new(registries: Arc<Registries>) -> Self {
        Self { registries }
    }

    /// Announces a peer's status to every other online peer.
    ///
    /// `connection_mode` is recomputed per recipient from the subject's
    /// and the recipient's address hashes. The subject may already be
    /// unregistered (offline announcements), so it is passed as a record
    /// rather than looked up.
    pub async fn peer_status_update(&self, subject: &Peer, status: PeerStatus) {
        let recipients: Vec<(Arc<ConnectionHandle>, ConnectionMode)> = {
            let state = self.registries.lock();
            state
                .peers
                .online_ordered()
                .into_iter()
                .filter(|p| p.user_id != subject.user_id)
                .filter_map(|p| {
                    self.registries
                        .sockets
                        .get(&p.socket_id)
                        .map(|handle| (handle, ConnectionMode::between(&subject.ip_hash, &p.ip_hash)))
                })
                .collect()
        };

        for (handle, connection_mode) in recipients {
            handle
                .send_frame(&ServerFrame::PeerStatusUpdate {
                    id: subject.user_id.clone(),
                    profile: Some(subject.profile.clone()),
                    status,
                    connection_mode,
                })
                .await;
        }
    }
}
