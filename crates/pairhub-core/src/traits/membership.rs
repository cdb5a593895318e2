//! Network membership resolution interface.

use async_trait::async_trait;

use crate::types::id::{NetworkId, UserId};

/// Maps a user to their active invite-code network.
///
/// Resolution failures degrade to `None`: the user stays connected with a
/// null network and an empty discovery horizon. Implementations swallow
/// and log their own errors.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// The network the user currently belongs to, if any.
    async fn active_network(&self, user_id: &UserId) -> Option<NetworkId>;
}
