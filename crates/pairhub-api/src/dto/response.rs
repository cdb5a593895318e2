//! Health response DTOs.

use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since process start.
    pub uptime_seconds: u64,
}

/// Detailed health response with registry gauges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// Live socket count.
    pub connections: usize,
    /// Registered peer count.
    pub peers: usize,
    /// Active session count.
    pub sessions: usize,
    /// Pending connection-request count.
    pub pending_requests: usize,
}
