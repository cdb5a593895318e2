//! In-memory registries: sockets, peers, sessions, pending requests.
//!
//! The socket registry is a concurrent map so the send path never takes
//! a lock. The peer, session, and request registries share one coarse
//! mutex; every handler that mutates more than one of them does so under
//! a single lock acquisition so the cross-registry invariants
//! (socket↔peer consistency, session↔peer membership) are never visible
//! as violated to a concurrent reader. Broadcasts snapshot their
//! recipient sets under the lock and send after releasing it.

pub mod peer;
pub mod request;
pub mod session;
pub mod socket;

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub use peer::{Peer, PeerRegistry};
pub use request::{ConnectionRequest, RequestRegistry};
pub use session::{Participant, Session, SessionRegistry, SessionStatus};
pub use socket::SocketRegistry;

use pairhub_core::types::UserId;

/// The three registries guarded by the coarse lock.
#[derive(Debug)]
pub struct RegistryState {
    /// Registered peers.
    pub peers: PeerRegistry,
    /// Active pairwise sessions.
    pub sessions: SessionRegistry,
    /// Pending connection requests.
    pub requests: RequestRegistry,
}

impl RegistryState {
    fn new(request_ttl: Duration) -> Self {
        Self {
            peers: PeerRegistry::new(),
            sessions: SessionRegistry::new(),
            requests: RequestRegistry::new(request_ttl),
        }
    }

    /// Full departure cleanup for a user: every session they participate
    /// in loses them (ending the session), and every pending request
    /// they sent or were sent is purged.
    pub fn handle_user_disconnect(&mut self, user_id: &UserId) {
        self.sessions
            .handle_user_disconnect(&mut self.peers, user_id);
        self.requests.purge_for_user(user_id);
    }
}

/// All shared connection state.
#[derive(Debug)]
pub struct Registries {
    /// Socket id → live connection handle.
    pub sockets: SocketRegistry,
    state: Mutex<RegistryState>,
}

impl Registries {
    /// Creates empty registries.
    pub fn new(request_ttl: Duration) -> Self {
        Self {
            sockets: SocketRegistry::new(),
            state: Mutex::new(RegistryState::new(request_ttl)),
        }
    }

    /// Acquires the coarse registry lock.
    ///
    /// Registry operations are synchronous and non-suspending; the guard
    /// must never be held across an await point.
    pub fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
