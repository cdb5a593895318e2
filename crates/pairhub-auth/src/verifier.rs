//! JWT bearer-token verification.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

use pairhub_core::config::AuthConfig;
use pairhub_core::traits::{IdentityError, IdentityVerifier};
use pairhub_core::types::identity::UserIdentity;

use crate::claims::Claims;

/// Verifies HS256-signed bearer tokens against a shared secret.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtIdentityVerifier {
    /// Creates a new verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Missing);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::warn!(error = %e, "bearer token rejected");
            match e.kind() {
                JwtErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::Invalid,
            }
        })?;

        Ok(data.claims.into_identity())
    }
}
