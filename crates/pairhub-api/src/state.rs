//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use pairhub_core::config::AppConfig;
use pairhub_realtime::RendezvousEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Rendezvous engine.
    pub engine: Arc<RendezvousEngine>,
    /// Process start time, for the uptime gauge.
    pub started_at: Instant,
}
