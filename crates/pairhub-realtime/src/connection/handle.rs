//! Individual connection handle — send, liveness, close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, warn};

use pairhub_core::types::identity::UserIdentity;
use pairhub_core::types::{IpHash, NetworkId, SocketId, UserId};

use crate::message::ServerFrame;

use super::state::{ConnState, ConnectionPhase};

/// Item on a connection's outbound channel, drained by the socket writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A serialized application frame.
    Frame(String),
    /// A low-level WebSocket ping.
    Ping,
    /// Close the socket with an application close code, then stop writing.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// A single live connection.
///
/// The handle is shared between the socket actor, the registries, the
/// heartbeat supervisor, and any handler that routes frames to this
/// connection. The send path is an mpsc channel so concurrent senders
/// never interleave partial writes.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique socket identifier.
    pub socket_id: SocketId,
    /// Salted hash of the client source address.
    pub ip_hash: IpHash,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
    /// Outbound channel to the socket writer.
    tx: mpsc::Sender<Outbound>,
    /// Liveness flag, cleared by the heartbeat sweep and set by traffic.
    alive: AtomicBool,
    /// Single-shot close gate: heartbeat termination, supersession, and
    /// peer-initiated close can race; only the first transition runs
    /// cleanup.
    closed: AtomicBool,
    /// Phase, identity, and network.
    state: Mutex<ConnState>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiving half of its outbound channel.
    pub fn new(ip_hash: IpHash, buffer: usize) -> (Arc<Self>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = Arc::new(Self {
            socket_id: SocketId::generate(),
            ip_hash,
            connected_at: Utc::now(),
            tx,
            alive: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            state: Mutex::new(ConnState::new()),
        });
        (handle, rx)
    }

    /// Sends an application frame. Best-effort: a closed or backed-up
    /// connection drops the frame with a log line, never an error to the
    /// caller.
    pub async fn send_frame(&self, frame: &ServerFrame) {
        if self.is_closed() {
            return;
        }
        let text = match serde_json::to_string(frame) {
            Ok(t) => t,
            Err(e) => {
                error!(socket_id = %self.socket_id, error = %e, "failed to serialize frame");
                return;
            }
        };
        if self.tx.send(Outbound::Frame(text)).await.is_err() {
            warn!(socket_id = %self.socket_id, "outbound channel closed, frame dropped");
        }
    }

    /// Sends an `ERROR` frame with the code's default message.
    pub async fn send_error(&self, code: crate::message::ErrorCode) {
        self.send_frame(&ServerFrame::error(code)).await;
    }

    /// Sends a low-level WebSocket ping.
    pub async fn send_ping(&self) {
        if self.tx.send(Outbound::Ping).await.is_err() {
            warn!(socket_id = %self.socket_id, "outbound channel closed, ping dropped");
        }
    }

    /// Sends a final frame followed by a close to a connection whose
    /// close gate has already been claimed (supersession, auth failure,
    /// auth timeout). Bypasses the closed check so the farewell still
    /// reaches the writer.
    pub async fn send_farewell(&self, frame: &ServerFrame, code: u16, reason: &str) {
        match serde_json::to_string(frame) {
            Ok(text) => {
                let _ = self.tx.send(Outbound::Frame(text)).await;
            }
            Err(e) => {
                error!(socket_id = %self.socket_id, error = %e, "failed to serialize frame");
            }
        }
        let _ = self
            .tx
            .send(Outbound::Close {
                code,
                reason: reason.to_string(),
            })
            .await;
    }

    /// Enqueues a close; the writer emits the close frame and stops.
    pub async fn enqueue_close(&self, code: u16, reason: &str) {
        let _ = self
            .tx
            .send(Outbound::Close {
                code,
                reason: reason.to_string(),
            })
            .await;
    }

    /// Whether the last heartbeat window saw traffic.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Sets or clears the liveness flag.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Relaxed);
    }

    /// Claims the single-shot close gate. Returns true exactly once.
    pub fn begin_close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    /// Whether the connection has been closed (or is closing).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.lock_state().phase
    }

    /// Installs the verified identity and resolved network, moving the
    /// connection to `Authed`.
    pub fn set_authed(&self, identity: UserIdentity, network: Option<NetworkId>) {
        let mut state = self.lock_state();
        state.phase = ConnectionPhase::Authed;
        state.identity = Some(identity);
        state.network = network;
    }

    /// Moves the connection to `Registered`.
    pub fn set_registered(&self) {
        self.lock_state().phase = ConnectionPhase::Registered;
    }

    /// The verified identity, if authenticated.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.lock_state().identity.clone()
    }

    /// The authenticated user id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.lock_state().identity.as_ref().map(|i| i.user_id.clone())
    }

    /// The network resolved at AUTH, if any.
    pub fn network(&self) -> Option<NetworkId> {
        self.lock_state().network.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
