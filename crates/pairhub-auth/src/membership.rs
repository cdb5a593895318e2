//! Configuration-backed membership resolution.

use std::collections::HashMap;

use async_trait::async_trait;

use pairhub_core::config::MembershipConfig;
use pairhub_core::traits::MembershipResolver;
use pairhub_core::types::{NetworkId, UserId};

/// Resolves network membership from a static configuration table.
///
/// Process-local stand-in for the durable membership store; unknown
/// users resolve to `None` and stay connected without a network.
#[derive(Debug, Clone)]
pub struct StaticMembershipResolver {
    assignments: HashMap<UserId, NetworkId>,
}

impl StaticMembershipResolver {
    /// Builds a resolver from the configuration table.
    pub fn new(config: &MembershipConfig) -> Self {
        let assignments = config
            .assignments
            .iter()
            .map(|(user, network)| (UserId::new(user.clone()), NetworkId::new(network.clone())))
            .collect();

        Self { assignments }
    }
}

#[async_trait]
impl MembershipResolver for StaticMembershipResolver {
    async fn active_network(&self, user_id: &UserId) -> Option<NetworkId> {
        self.assignments.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StaticMembershipResolver {
        let mut assignments = HashMap::new();
        assignments.insert("user_1".to_string(), "net_x".to_string());
        StaticMembershipResolver::new(&MembershipConfig { assignments })
    }

    #[tokio::test]
    async fn test_known_user_resolves() {
        let network = resolver().active_network(&UserId::new("user_1")).await;
        assert_eq!(network, Some(NetworkId::new("net_x")));
    }

    #[tokio::test]
    async fn test_unknown_user_resolves_to_none() {
        let network = resolver().active_network(&UserId::new("user_9")).await;
        assert_eq!(network, None);
    }
}
