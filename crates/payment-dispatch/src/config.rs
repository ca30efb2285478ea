//! Dispatch configuration.

use crate::types::Environment;
use serde::Deserialize;
use std::time::Duration;

/// Main dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// UPI address payments are collected into.
    #[serde(default = "default_merchant_vpa")]
    pub merchant_vpa: String,

    /// Payee name shown in wallet apps.
    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,

    /// ISO currency code for deep links.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Credential environment for all gateways.
    #[serde(default)]
    pub environment: Environment,

    /// Prefix of generated order ids.
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,

    /// Time a wallet app takes to report back.
    #[serde(default = "default_gateway_delay", with = "humantime_serde")]
    pub gateway_delay: Duration,

    /// Latency of the simulated remote processor.
    #[serde(default = "default_remote_delay", with = "humantime_serde")]
    pub remote_delay: Duration,

    /// Time to confirm a cash order.
    #[serde(default = "default_cash_delay", with = "humantime_serde")]
    pub cash_delay: Duration,

    /// Balance every stored-value card reports, in minor units.
    #[serde(default = "default_stored_balance")]
    pub stored_balance: u64,

    /// Wallet packages treated as installed on the device.
    #[serde(default)]
    pub installed_apps: Vec<String>,

    /// Razorpay keys; the gateway is offered only when set.
    pub razorpay: Option<ProcessorConfig>,

    /// Stripe keys; the gateway is offered only when set.
    pub stripe: Option<ProcessorConfig>,

    /// PayPal keys; the gateway is offered only when set.
    pub paypal: Option<ProcessorConfig>,
}

fn default_merchant_vpa() -> String {
    "cafecheckout@upi".to_string()
}

fn default_merchant_name() -> String {
    "Cafe Checkout".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_order_prefix() -> String {
    "ORD".to_string()
}

fn default_gateway_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_remote_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_cash_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_stored_balance() -> u64 {
    50_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            merchant_vpa: default_merchant_vpa(),
            merchant_name: default_merchant_name(),
            currency: default_currency(),
            environment: Environment::default(),
            order_prefix: default_order_prefix(),
            gateway_delay: default_gateway_delay(),
            remote_delay: default_remote_delay(),
            cash_delay: default_cash_delay(),
            stored_balance: default_stored_balance(),
            installed_apps: Vec::new(),
            razorpay: None,
            stripe: None,
            paypal: None,
        }
    }
}

/// Merchant keys for a remote processor.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Publishable key or client id.
    pub key_id: String,

    /// Server-side secret.
    pub key_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.order_prefix, "ORD");
        assert_eq!(config.currency, "INR");
        assert_eq!(config.gateway_delay, Duration::from_secs(2));
        assert_eq!(config.cash_delay, Duration::from_millis(500));
        assert_eq!(config.environment, Environment::Staging);
        assert!(config.stripe.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DispatchConfig = serde_json::from_value(serde_json::json!({
            "merchant_vpa": "shop@okaxis",
            "gateway_delay": "250ms",
            "environment": "production",
            "stripe": { "key_id": "pk_test_1", "key_secret": "sk_test_1" }
        }))
        .unwrap();

        assert_eq!(config.merchant_vpa, "shop@okaxis");
        assert_eq!(config.gateway_delay, Duration::from_millis(250));
        assert_eq!(config.remote_delay, Duration::from_secs(1));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.stripe.unwrap().key_id, "pk_test_1");
    }
}
