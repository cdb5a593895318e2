//! Heartbeat supervisor — periodic liveness sweep over registered
//! sockets.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::engine::RendezvousEngine;

/// Sweeps all registered connections on a fixed cadence.
///
/// A connection that produced no traffic in one whole interval has its
/// liveness flag cleared and receives a low-level ping; one that is
/// still flagged dead at the next sweep (two intervals without traffic)
/// is terminated. Connections that never authenticate are covered by
/// the per-connection auth watchdog instead.
pub struct HeartbeatSupervisor {
    sweep_interval: Duration,
}

impl HeartbeatSupervisor {
    /// Creates a supervisor with the configured sweep interval.
    pub fn new(sweep_interval: Duration) -> Self {
        Self { sweep_interval }
    }

    /// Runs the sweep loop until shutdown.
    pub async fn run(&self, engine: Arc<RendezvousEngine>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.sweep_interval);
        // The first tick fires immediately; skip it so a fresh
        // connection gets a full interval before its first check.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep(&engine).await,
                _ = shutdown.recv() => {
                    debug!("heartbeat supervisor stopping");
                    return;
                }
            }
        }
    }

    /// One pass: terminate the dead, challenge the rest.
    async fn sweep(&self, engine: &Arc<RendezvousEngine>) {
        for handle in engine.registries.sockets.all() {
            if handle.is_closed() {
                continue;
            }
            if !handle.is_alive() {
                warn!(socket_id = %handle.socket_id, "heartbeat timeout, terminating");
                engine.terminate(&handle, 1001, "heartbeat timeout").await;
            } else {
                handle.set_alive(false);
                handle.send_ping().await;
            }
        }
    }
}
