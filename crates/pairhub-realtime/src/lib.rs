//! Real-time rendezvous engine for PairHub.
//!
//! Provides:
//! - Per-connection lifecycle state machine (connected → authed → registered)
//! - Peer, session, request, and socket registries with cross-registry
//!   invariants held under a single coarse lock
//! - Invite-code-network-scoped discovery and pairing
//! - Duplicate-connection supersession
//! - Heartbeat-driven liveness and pending-request expiry
//! - The JSON wire protocol binding them together

pub mod broadcast;
pub mod connection;
pub mod dispatch;
pub mod engine;
pub mod handlers;
pub mod message;
pub mod registry;

pub use engine::RendezvousEngine;
