//! Identity verification and membership resolution for PairHub.
//!
//! Implements the two collaborator traits the rendezvous core consumes:
//! - [`JwtIdentityVerifier`] — HS256 bearer-token verification
//! - [`StaticMembershipResolver`] — configuration-backed network lookup

pub mod claims;
pub mod membership;
pub mod verifier;

pub use membership::StaticMembershipResolver;
pub use verifier::JwtIdentityVerifier;
