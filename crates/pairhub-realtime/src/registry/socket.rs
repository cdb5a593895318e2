//! Socket registry — socket id → live connection handle.

use std::sync::Arc;

use dashmap::DashMap;

use pairhub_core::types::SocketId;

use crate::connection::handle::ConnectionHandle;

/// Concurrent map from socket id to connection handle.
///
/// A socket is registered at AUTH time and unregistered on disconnect.
/// Reads on the send path go through this map without touching the
/// coarse registry lock.
#[derive(Debug, Default)]
pub struct SocketRegistry {
    sockets: DashMap<SocketId, Arc<ConnectionHandle>>,
}

impl SocketRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sockets: DashMap::new(),
        }
    }

    /// Registers a connection under its socket id.
    pub fn register(&self, handle: Arc<ConnectionHandle>) {
        self.sockets.insert(handle.socket_id.clone(), handle);
    }

    /// Removes a socket mapping.
    pub fn unregister(&self, socket_id: &SocketId) -> Option<Arc<ConnectionHandle>> {
        self.sockets.remove(socket_id).map(|(_, handle)| handle)
    }

    /// Looks up a live connection handle.
    pub fn get(&self, socket_id: &SocketId) -> Option<Arc<ConnectionHandle>> {
        self.sockets.get(socket_id).map(|entry| entry.value().clone())
    }

    /// All registered handles.
    pub fn all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.sockets.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of registered sockets.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}
