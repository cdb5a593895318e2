//! Request registry — short-lived pending connection requests.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use pairhub_core::types::{RequestId, UserId};

/// A pending pairing request. Lives until answered, expired, or either
/// endpoint disconnects.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    /// Unique request id.
    pub request_id: RequestId,
    /// The requester.
    pub from_user_id: UserId,
    /// The addressee.
    pub to_user_id: UserId,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
    /// Monotonic creation instant, used for expiry.
    created: Instant,
}

/// Registry of pending requests with a fixed TTL.
///
/// Expired entries are evicted lazily on lookup and by a periodic sweep;
/// no handler ever observes a request older than the TTL.
#[derive(Debug)]
pub struct RequestRegistry {
    requests: HashMap<RequestId, ConnectionRequest>,
    ttl: Duration,
}

impl RequestRegistry {
    /// Creates an empty registry with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            requests: HashMap::new(),
            ttl,
        }
    }

    /// Creates a pending request and returns its id.
    pub fn create(&mut self, from: UserId, to: UserId) -> RequestId {
        let request_id = RequestId::generate();
        self.requests.insert(
            request_id.clone(),
            ConnectionRequest {
                request_id: request_id.clone(),
                from_user_id: from,
                to_user_id: to,
                created_at: Utc::now(),
                created: Instant::now(),
            },
        );
        request_id
    }

    /// Looks up a pending request, evicting it first if it has expired.
    pub fn get(&mut self, request_id: &RequestId) -> Option<&ConnectionRequest> {
        if let Some(request) = self.requests.get(request_id) {
            if request.created.elapsed() > self.ttl {
                self.requests.remove(request_id);
                return None;
            }
        }
        self.requests.get(request_id)
    }

    /// Removes a request.
    pub fn remove(&mut self, request_id: &RequestId) -> Option<ConnectionRequest> {
        self.requests.remove(request_id)
    }

    /// Evicts every expired request. Returns the number evicted.
    pub fn sweep(&mut self) -> usize {
        let before = self.requests.len();
        let ttl = self.ttl;
        self.requests.retain(|_, r| r.created.elapsed() <= ttl);
        let evicted = before - self.requests.len();
        if evicted > 0 {
            debug!(evicted, "expired connection requests evicted");
        }
        evicted
    }

    /// Drops every request sent by or addressed to a departing user.
    pub fn purge_for_user(&mut self, user_id: &UserId) -> usize {
        let before = self.requests.len();
        self.requests
            .retain(|_, r| r.from_user_id != *user_id && r.to_user_id != *user_id);
        before - self.requests.len()
    }

    /// Number of pending requests (including any not yet swept).
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
