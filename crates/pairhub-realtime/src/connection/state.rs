//! Connection lifecycle phases.

use pairhub_core::types::identity::UserIdentity;
use pairhub_core::types::NetworkId;

/// Lifecycle phase of a connection. Transitions are monotonically
/// forward; a connection never returns to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionPhase {
    /// Socket open, unauthenticated. Only `AUTH` and `PING` are acted on.
    Connected,
    /// Identity verified, not yet in the peer registry.
    Authed,
    /// Present in the peer registry; eligible for discovery and pairing.
    Registered,
}

/// Mutable per-connection state guarded by the handle's mutex.
#[derive(Debug)]
pub(crate) struct ConnState {
    /// Current lifecycle phase.
    pub phase: ConnectionPhase,
    /// Verified identity, set at AUTH.
    pub identity: Option<UserIdentity>,
    /// Network resolved at AUTH; immutable for the connection's lifetime.
    pub network: Option<NetworkId>,
}

impl ConnState {
    pub fn new() -> Self {
        Self {
            phase: ConnectionPhase::Connected,
            identity: None,
            network: None,
        }
    }
}
