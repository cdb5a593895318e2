//! Peer registry — registered users and their live connection bindings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pairhub_core::types::{
    ConnectionMode, IpHash, NetworkId, PeerProfile, PeerStatus, SessionId, SocketId, UserId,
};

/// A registered peer. At most one exists per user id at any time.
#[derive(Debug, Clone, Serialize)]
pub struct Peer {
    /// Opaque user id from the identity provider.
    pub user_id: UserId,
    /// The socket currently carrying this peer.
    pub socket_id: SocketId,
    /// Profile assembled at registration.
    pub profile: PeerProfile,
    /// Externally observable status.
    pub status: PeerStatus,
    /// Sessions this peer participates in.
    pub session_ids: Vec<SessionId>,
    /// Salted source-address hash.
    pub ip_hash: IpHash,
    /// Network resolved at AUTH; immutable for the connection's lifetime.
    pub network_id: Option<NetworkId>,
    /// Transport locality stored on the record; served as-is in
    /// discovery responses.
    pub connection_mode: ConnectionMode,
    /// When the peer registered.
    pub connected_at: DateTime<Utc>,
    /// Last observed activity.
    pub last_activity_at: DateTime<Utc>,
    /// Registration sequence number; broadcast recipients are ordered
    /// by it.
    pub(crate) order: u64,
}

/// Primary mapping user id → peer, with a secondary socket id → user id
/// index. Both sides are updated together in every operation.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    by_user: HashMap<UserId, Peer>,
    by_socket: HashMap<SocketId, UserId>,
    next_order: u64,
}

impl PeerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer, replacing any prior record for the same user.
    ///
    /// The supersession path removes the prior record before this is
    /// called; when a prior record still exists its socket mapping is
    /// dropped and its session list carried into the new record.
    pub fn register(
        &mut self,
        user_id: UserId,
        profile: PeerProfile,
        socket_id: SocketId,
        ip_hash: IpHash,
        network_id: Option<NetworkId>,
    ) -> &Peer {
        let mut session_ids = Vec::new();
        if let Some(prior) = self.by_user.remove(&user_id) {
            self.by_socket.remove(&prior.socket_id);
            session_ids = prior.session_ids;
        }

        let now = Utc::now();
        let order = self.next_order;
        self.next_order += 1;

        let peer = Peer {
            user_id: user_id.clone(),
            socket_id: socket_id.clone(),
            profile,
            status: PeerStatus::Online,
            session_ids,
            ip_hash,
            network_id,
            connection_mode: ConnectionMode::Remote,
            connected_at: now,
            last_activity_at: now,
            order,
        };

        self.by_socket.insert(socket_id, user_id.clone());
        self.by_user.entry(user_id).or_insert(peer)
    }

    /// Removes a peer by user id.
    pub fn unregister_by_user(&mut self, user_id: &UserId) -> Option<Peer> {
        let peer = self.by_user.remove(user_id)?;
        self.by_socket.remove(&peer.socket_id);
        Some(peer)
    }

    /// Removes a peer by socket id.
    pub fn unregister_by_socket(&mut self, socket_id: &SocketId) -> Option<Peer> {
        let user_id = self.by_socket.remove(socket_id)?;
        self.by_user.remove(&user_id)
    }

    /// Looks up a peer by user id.
    pub fn lookup_by_user(&self, user_id: &UserId) -> Option<&Peer> {
        self.by_user.get(user_id)
    }

    /// Looks up a peer by socket id.
    pub fn lookup_by_socket(&self, socket_id: &SocketId) -> Option<&Peer> {
        self.by_socket
            .get(socket_id)
            .and_then(|user_id| self.by_user.get(user_id))
    }

    /// Updates a peer's status.
    pub fn update_status(&mut self, user_id: &UserId, status: PeerStatus) -> bool {
        match self.by_user.get_mut(user_id) {
            Some(peer) => {
                peer.status = status;
                true
            }
            None => false,
        }
    }

    /// Stamps a peer's activity time.
    pub fn update_activity(&mut self, user_id: &UserId) {
        if let Some(peer) = self.by_user.get_mut(user_id) {
            peer.last_activity_at = Utc::now();
        }
    }

    /// Adds a session to a peer's session list. Idempotent.
    pub fn add_session(&mut self, user_id: &UserId, session_id: &SessionId) {
        if let Some(peer) = self.by_user.get_mut(user_id) {
            if !peer.session_ids.contains(session_id) {
                peer.session_ids.push(session_id.clone());
            }
        }
    }

    /// Removes a session from a peer's session list.
    pub fn remove_session(&mut self, user_id: &UserId, session_id: &SessionId) {
        if let Some(peer) = self.by_user.get_mut(user_id) {
            peer.session_ids.retain(|s| s != session_id);
        }
    }

    /// Online peers in a network, in registration order.
    ///
    /// A peer with a null network never matches; callers with a null
    /// network get an empty discovery horizon before reaching here.
    pub fn online_in_network(&self, network_id: &NetworkId) -> Vec<&Peer> {
        let mut peers: Vec<&Peer> = self
            .by_user
            .values()
            .filter(|p| p.status == PeerStatus::Online)
            .filter(|p| p.network_id.as_ref() == Some(network_id))
            .collect();
        peers.sort_by_key(|p| p.order);
        peers
    }

    /// All online peers, in registration order.
    pub fn online_ordered(&self) -> Vec<&Peer> {
        let mut peers: Vec<&Peer> = self
            .by_user
            .values()
            .filter(|p| p.status == PeerStatus::Online)
            .collect();
        peers.sort_by_key(|p| p.order);
        peers
    }

    /// True iff both peers carry the same non-empty address hash.
    pub fn same_lan(&self, a: &UserId, b: &UserId) -> bool {
        match (self.by_user.get(a), self.by_user.get(b)) {
            (Some(pa), Some(pb)) => pa.ip_hash.matches(&pb.ip_hash),
            _ => false,
        }
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}
