//! JWT claim schema for PairHub bearer tokens.

use serde::{Deserialize, Serialize};

use pairhub_core::types::identity::UserIdentity;
use pairhub_core::types::UserId;

/// Claims carried by a PairHub access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the opaque user id.
    pub sub: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// E-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Issuing identity provider tag.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-asserted roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    /// Issued-at as a unix timestamp.
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Converts verified claims into a [`UserIdentity`].
    ///
    /// A missing display name falls back to the subject.
    pub fn into_identity(self) -> UserIdentity {
        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.sub.clone());

        UserIdentity {
            user_id: UserId::new(self.sub),
            display_name,
            email: self.email.unwrap_or_default(),
            provider_tag: self.provider,
            roles: self.roles,
        }
    }
}

fn default_provider() -> String {
    "unknown".to_string()
}
