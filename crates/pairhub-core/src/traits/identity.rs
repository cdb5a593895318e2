//! Identity verification interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::identity::UserIdentity;

/// Why a bearer credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No credential was presented.
    #[error("credential missing")]
    Missing,
    /// The credential failed verification.
    #[error("credential invalid")]
    Invalid,
    /// The credential was valid but has expired.
    #[error("credential expired")]
    Expired,
    /// The identity provider could not be reached.
    #[error("identity provider unavailable")]
    Unavailable,
}

/// Validates a bearer credential against the identity provider.
///
/// Verification is the only per-event operation allowed to suspend the
/// calling task; implementations may perform network I/O.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the identity it carries.
    async fn verify(&self, token: &str) -> Result<UserIdentity, IdentityError>;
}
