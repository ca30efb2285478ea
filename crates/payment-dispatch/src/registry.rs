//! Registry of gateway profiles.

use crate::profile::GatewayProfile;
use crate::types::GatewayId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Profiles keyed by gateway. Registration can happen while payments run.
#[derive(Debug, Default)]
pub struct GatewayRegistry {
    profiles: RwLock<HashMap<GatewayId, Arc<GatewayProfile>>>,
}

impl GatewayRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the given profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = GatewayProfile>) -> Self {
        let registry = Self::new();
        for profile in profiles {
            registry.register(profile);
        }
        registry
    }

    /// Register a profile, replacing any previous one for the same gateway.
    pub fn register(&self, profile: GatewayProfile) -> Option<Arc<GatewayProfile>> {
        let id = profile.gateway_id;
        let previous = self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(profile));
        debug!(gateway = %id, replaced = previous.is_some(), "Registered gateway profile");
        previous
    }

    /// Get the profile for a gateway.
    pub fn get(&self, id: GatewayId) -> Option<Arc<GatewayProfile>> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: GatewayId) -> bool {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// All profiles, ordered by gateway.
    pub fn list(&self) -> Vec<Arc<GatewayProfile>> {
        let mut profiles: Vec<_> = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.gateway_id);
        profiles
    }

    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = GatewayRegistry::new();
        assert!(registry.get(GatewayId::Paytm).is_none());

        registry.register(GatewayProfile::new(GatewayId::Paytm, "shop@paytm"));
        let profile = registry.get(GatewayId::Paytm).unwrap();
        assert_eq!(profile.merchant.merchant_id, "shop@paytm");
        assert!(registry.contains(GatewayId::Paytm));
        assert!(!registry.contains(GatewayId::Phonepe));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = GatewayRegistry::new();
        assert!(registry
            .register(GatewayProfile::new(GatewayId::Card, "first"))
            .is_none());

        let previous = registry
            .register(GatewayProfile::new(GatewayId::Card, "second"))
            .unwrap();
        assert_eq!(previous.merchant.merchant_id, "first");
        assert_eq!(
            registry.get(GatewayId::Card).unwrap().merchant.merchant_id,
            "second"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_is_ordered() {
        let registry = GatewayRegistry::with_profiles([
            GatewayProfile::new(GatewayId::CashStore, "m"),
            GatewayProfile::new(GatewayId::Phonepe, "m"),
            GatewayProfile::new(GatewayId::Card, "m"),
        ]);

        let ids: Vec<_> = registry.list().iter().map(|p| p.gateway_id).collect();
        assert_eq!(
            ids,
            vec![GatewayId::Phonepe, GatewayId::Card, GatewayId::CashStore]
        );
    }
}
