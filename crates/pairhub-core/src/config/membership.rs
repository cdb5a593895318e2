//! Static membership assignments for the built-in resolver.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration-backed `user_id -> network_id` table.
///
/// This is the process-local stand-in for the durable membership store;
/// deployments with a directory service implement
/// [`MembershipResolver`](crate::traits::MembershipResolver) against it
/// instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// User id to network id assignments.
    #[serde(default)]
    pub assignments: HashMap<String, String>,
}
