//! Top-level rendezvous engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info};

use pairhub_core::config::RealtimeConfig;
use pairhub_core::traits::{IdentityVerifier, MembershipResolver};
use pairhub_core::types::{IpHash, PeerStatus};

use crate::broadcast::Broadcaster;
use crate::connection::handle::{ConnectionHandle, Outbound};
use crate::connection::heartbeat::HeartbeatSupervisor;
use crate::connection::state::ConnectionPhase;
use crate::dispatch;
use crate::message::codes::CLOSE_AUTH_FAILURE;
use crate::message::{ErrorCode, ServerFrame};
use crate::registry::peer::Peer;
use crate::registry::Registries;

/// Central rendezvous engine: registries, collaborators, background
/// supervision, and the entry points the socket layer drives.
pub struct RendezvousEngine {
    /// Shared connection state.
    pub registries: Arc<Registries>,
    /// Status fan-out.
    pub broadcaster: Broadcaster,
    /// Identity provider interface.
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Membership store interface.
    pub membership: Arc<dyn MembershipResolver>,
    config: RealtimeConfig,
    /// Monotonic anchor for PONG timestamps.
    epoch: Instant,
    /// Shutdown signal for background tasks.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RendezvousEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendezvousEngine").finish()
    }
}

impl RendezvousEngine {
    /// Creates an engine with the given collaborators. Background tasks
    /// are not started until [`start`](Self::start).
    pub fn new(
        config: RealtimeConfig,
        verifier: Arc<dyn IdentityVerifier>,
        membership: Arc<dyn MembershipResolver>,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        let registries = Arc::new(Registries::new(Duration::from_secs(
            config.request_ttl_seconds,
        )));
        let broadcaster = Broadcaster::new(registries.clone());

        info!("rendezvous engine initialized");

        Arc::new(Self {
            registries,
            broadcaster,
            verifier,
            membership,
            config,
            epoch: Instant::now(),
            shutdown_tx,
        })
    }

    /// Spawns the heartbeat supervisor and the request sweep.
    pub fn start(self: &Arc<Self>) {
        let supervisor = HeartbeatSupervisor::new(Duration::from_secs(
            self.config.heartbeat_interval_seconds,
        ));
        let engine = self.clone();
        let shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            supervisor.run(engine, shutdown).await;
        });

        let engine = self.clone();
        let mut shutdown = self.shutdown_tx.subscribe();
        let sweep_interval = Duration::from_secs(self.config.request_sweep_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.registries.lock().requests.sweep();
                    }
                    _ = shutdown.recv() => {
                        debug!("request sweep stopping");
                        return;
                    }
                }
            }
        });
    }

    /// Accepts a new connection: creates its handle and outbound
    /// channel and arms the auth watchdog. The socket is not registered
    /// until AUTH succeeds.
    pub fn connect(self: &Arc<Self>, ip_hash: IpHash) -> (Arc<ConnectionHandle>, mpsc::Receiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::new(ip_hash, self.config.channel_buffer_size);
        debug!(socket_id = %handle.socket_id, "connection accepted");

        let engine = self.clone();
        let watched = handle.clone();
        let timeout = Duration::from_secs(self.config.auth_timeout_seconds);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            engine.abort_unauthenticated(&watched).await;
        });

        (handle, rx)
    }

    /// Handles one inbound text frame.
    pub async fn handle_frame(self: &Arc<Self>, handle: &Arc<ConnectionHandle>, raw: &str) {
        dispatch::dispatch(self, handle, raw).await;
    }

    /// Disconnect path for a socket that has already closed (peer
    /// initiated, or transport error). Idempotent with heartbeat
    /// termination and supersession through the close gate.
    pub async fn handle_disconnect(&self, handle: &Arc<ConnectionHandle>) {
        self.finalize(handle, None).await;
    }

    /// Server-initiated termination: disconnect cleanup plus a close
    /// frame with the given code.
    pub async fn terminate(&self, handle: &Arc<ConnectionHandle>, code: u16, reason: &str) {
        self.finalize(handle, Some((code, reason.to_string()))).await;
    }

    /// Auth-watchdog firing: if the connection is still unauthenticated
    /// when the timer elapses, report and close. The phase check and the
    /// close-gate claim happen under the registry lock, mutually
    /// exclusive with AUTH installing its identity; an AUTH completing
    /// after this is a no-op.
    async fn abort_unauthenticated(&self, handle: &Arc<ConnectionHandle>) {
        let fire = {
            let _state = self.registries.lock();
            handle.phase() == ConnectionPhase::Connected && handle.begin_close()
        };
        if !fire {
            return;
        }

        info!(socket_id = %handle.socket_id, "authentication timeout");
        handle
            .send_farewell(
                &ServerFrame::error(ErrorCode::TokenMissing),
                CLOSE_AUTH_FAILURE,
                "authentication timeout",
            )
            .await;
    }

    /// Single-shot teardown: registry cleanup, optional close frame,
    /// offline announcement.
    async fn finalize(&self, handle: &Arc<ConnectionHandle>, close: Option<(u16, String)>) {
        if !handle.begin_close() {
            return;
        }

        let removed: Option<Peer> = {
            let mut state = self.registries.lock();
            let removed = match handle.user_id() {
                // Only tear down user state this socket still owns; a
                // replaced registration for the same user belongs to a
                // newer connection.
                Some(user_id)
                    if state
                        .peers
                        .lookup_by_user(&user_id)
                        .is_some_and(|p| p.socket_id == handle.socket_id) =>
                {
                    state.handle_user_disconnect(&user_id);
                    state.peers.unregister_by_user(&user_id)
                }
                _ => None,
            };
            self.registries.sockets.unregister(&handle.socket_id);
            removed
        };

        if let Some((code, reason)) = close {
            handle.enqueue_close(code, &reason).await;
        }

        if let Some(peer) = removed {
            info!(socket_id = %handle.socket_id, user_id = %peer.user_id, "peer disconnected");
            self.broadcaster
                .peer_status_update(&peer, PeerStatus::Offline)
                .await;
        } else {
            debug!(socket_id = %handle.socket_id, "connection closed");
        }
    }

    /// Milliseconds since the engine started; monotonically
    /// non-decreasing.
    pub fn monotonic_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Registered socket count.
    pub fn connection_count(&self) -> usize {
        self.registries.sockets.len()
    }

    /// Registered peer count.
    pub fn peer_count(&self) -> usize {
        self.registries.lock().peers.len()
    }

    /// Active session count.
    pub fn session_count(&self) -> usize {
        self.registries.lock().sessions.len()
    }

    /// Pending request count (including any awaiting sweep).
    pub fn pending_request_count(&self) -> usize {
        self.registries.lock().requests.len()
    }

    /// Signals background tasks to stop and closes every connection.
    pub async fn shutdown(&self) {
        info!("shutting down rendezvous engine");
        let _ = self.shutdown_tx.send(());

        for handle in self.registries.sockets.all() {
            self.terminate(&handle, 1001, "server shutting down").await;
        }

        info!("rendezvous engine shut down");
    }
}
