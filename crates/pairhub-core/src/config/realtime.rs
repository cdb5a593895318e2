//! Real-time rendezvous engine configuration.

use serde::{Deserialize, Serialize};

/// Rendezvous engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds a connection may stay unauthenticated before it is closed.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
    /// Heartbeat supervisor sweep interval in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Pending connection-request time to live in seconds.
    #[serde(default = "default_request_ttl")]
    pub request_ttl_seconds: u64,
    /// Expired-request sweep interval in seconds.
    #[serde(default = "default_request_sweep_interval")]
    pub request_sweep_interval_seconds: u64,
    /// Per-connection outbound channel buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Salt mixed into client address hashes.
    #[serde(default = "default_ip_salt")]
    pub ip_salt: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            auth_timeout_seconds: default_auth_timeout(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            request_ttl_seconds: default_request_ttl(),
            request_sweep_interval_seconds: default_request_sweep_interval(),
            channel_buffer_size: default_channel_buffer(),
            ip_salt: default_ip_salt(),
        }
    }
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_request_ttl() -> u64 {
    30
}

fn default_request_sweep_interval() -> u64 {
    10
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ip_salt() -> String {
    "change-me-in-production".to_string()
}
