//! Gateway profiles.

use crate::config::{DispatchConfig, ProcessorConfig};
use crate::types::{Environment, GatewayId, GatewayKind};
use secrecy::SecretString;
use serde::Serialize;
use std::collections::HashMap;

/// Merchant identity presented to a gateway.
#[derive(Debug, Clone, Serialize)]
pub struct MerchantCredentials {
    /// VPA for wallet apps, key id for processors, store id for tenders.
    pub merchant_id: String,
    pub merchant_name: String,
    #[serde(skip)]
    pub secret_key: Option<SecretString>,
}

/// Everything the dispatcher needs to drive one gateway.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayProfile {
    pub gateway_id: GatewayId,
    pub display_name: String,
    /// Android package of the wallet app.
    pub app_package: Option<String>,
    /// Store page opened when the customer chooses to install.
    pub install_url: Option<String>,
    pub merchant: MerchantCredentials,
    pub environment: Environment,
    /// Gateway-specific settings.
    pub params: HashMap<String, String>,
}

impl GatewayProfile {
    /// Profile with the gateway's stock package, store page and name.
    pub fn new(gateway_id: GatewayId, merchant_id: impl Into<String>) -> Self {
        let app_package = gateway_id.app_package().map(str::to_string);
        let install_url = app_package.as_deref().map(play_store_url);

        let mut params = HashMap::new();
        if gateway_id.kind() == GatewayKind::WalletApp {
            params.insert(
                "scheme".to_string(),
                gateway_id.deep_link_scheme().to_string(),
            );
        }

        Self {
            gateway_id,
            display_name: gateway_id.display_name().to_string(),
            app_package,
            install_url,
            merchant: MerchantCredentials {
                merchant_id: merchant_id.into(),
                merchant_name: String::new(),
                secret_key: None,
            },
            environment: Environment::default(),
            params,
        }
    }

    pub fn with_merchant_name(mut self, name: impl Into<String>) -> Self {
        self.merchant.merchant_name = name.into();
        self
    }

    pub fn with_secret_key(mut self, secret: impl Into<String>) -> Self {
        self.merchant.secret_key = Some(SecretString::new(secret.into()));
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_app_package(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        self.install_url = Some(play_store_url(&package));
        self.app_package = Some(package);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> GatewayKind {
        self.gateway_id.kind()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

fn play_store_url(package: &str) -> String {
    format!(
        "https://play.google.com/store/apps/details?id={}",
        urlencoding::encode(package)
    )
}

/// Profiles registered at start-up.
///
/// Wallet apps, card entry and tenders are always offered. Razorpay, Stripe
/// and PayPal appear only when their keys are configured.
pub fn default_profiles(config: &DispatchConfig) -> Vec<GatewayProfile> {
    let mut profiles = Vec::new();

    for id in GatewayId::ALL {
        let profile = match id.kind() {
            GatewayKind::WalletApp => Some(GatewayProfile::new(id, &config.merchant_vpa)),
            GatewayKind::RemoteProcessor => match id {
                GatewayId::Razorpay => processor_profile(id, config.razorpay.as_ref()),
                GatewayId::Stripe => processor_profile(id, config.stripe.as_ref()),
                GatewayId::Paypal => processor_profile(id, config.paypal.as_ref()),
                _ => Some(GatewayProfile::new(id, &config.merchant_vpa)),
            },
            GatewayKind::CashTender | GatewayKind::StoredBalance => {
                Some(GatewayProfile::new(id, &config.merchant_vpa))
            }
        };

        if let Some(profile) = profile {
            profiles.push(
                profile
                    .with_merchant_name(&config.merchant_name)
                    .with_environment(config.environment)
                    .with_param("currency", &config.currency),
            );
        }
    }

    profiles
}

fn processor_profile(id: GatewayId, keys: Option<&ProcessorConfig>) -> Option<GatewayProfile> {
    let keys = keys?;
    let profile = GatewayProfile::new(id, &keys.key_id);
    Some(match &keys.key_secret {
        Some(secret) => profile.with_secret_key(secret),
        None => profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_wallet_profile_defaults() {
        let profile = GatewayProfile::new(GatewayId::Phonepe, "shop@ybl");
        assert_eq!(profile.app_package.as_deref(), Some("com.phonepe.app"));
        assert_eq!(
            profile.install_url.as_deref(),
            Some("https://play.google.com/store/apps/details?id=com.phonepe.app")
        );
        assert_eq!(profile.param("scheme"), Some("phonepe://pay"));
        assert_eq!(profile.display_name, "PhonePe");
    }

    #[test]
    fn test_tender_profile_has_no_package() {
        let profile = GatewayProfile::new(GatewayId::CashStore, "store-1");
        assert!(profile.app_package.is_none());
        assert!(profile.install_url.is_none());
        assert!(profile.param("scheme").is_none());
    }

    #[test]
    fn test_default_profiles_skip_unconfigured_processors() {
        let profiles = default_profiles(&DispatchConfig::default());
        let ids: Vec<GatewayId> = profiles.iter().map(|p| p.gateway_id).collect();

        assert!(ids.contains(&GatewayId::GooglePay));
        assert!(ids.contains(&GatewayId::Card));
        assert!(ids.contains(&GatewayId::StoredBalanceCard));
        assert!(!ids.contains(&GatewayId::Stripe));
        assert!(!ids.contains(&GatewayId::Razorpay));
        assert_eq!(profiles.len(), 9);
    }

    #[test]
    fn test_default_profiles_with_processor_keys() {
        let config = DispatchConfig {
            stripe: Some(ProcessorConfig {
                key_id: "pk_test_1".to_string(),
                key_secret: Some("sk_test_1".to_string()),
            }),
            ..DispatchConfig::default()
        };

        let profiles = default_profiles(&config);
        let stripe = profiles
            .iter()
            .find(|p| p.gateway_id == GatewayId::Stripe)
            .unwrap();
        assert_eq!(stripe.merchant.merchant_id, "pk_test_1");
        assert_eq!(
            stripe.merchant.secret_key.as_ref().unwrap().expose_secret(),
            "sk_test_1"
        );
        assert_eq!(stripe.merchant.merchant_name, "Cafe Checkout");
    }

    #[test]
    fn test_secret_not_serialized() {
        let profile = GatewayProfile::new(GatewayId::Razorpay, "rzp_1").with_secret_key("s3cret");
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
