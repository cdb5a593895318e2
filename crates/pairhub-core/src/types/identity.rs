//! Verified user identity as returned by the identity provider.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A verified user identity.
///
/// Produced by an [`IdentityVerifier`](crate::traits::IdentityVerifier)
/// from a bearer credential; the `user_id` is opaque and stable across
/// connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Opaque, stable user identifier.
    pub user_id: UserId,
    /// Human-readable display name.
    pub display_name: String,
    /// E-mail address (may be empty when the provider withholds it).
    pub email: String,
    /// Which provider vouched for this identity (e.g. `"github"`).
    pub provider_tag: String,
    /// Provider-asserted roles.
    pub roles: Vec<String>,
}
