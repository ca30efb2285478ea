//! OTP configuration.

use serde::Deserialize;
use std::time::Duration;

/// Channel policy and backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// Country prefix applied to numbers without a `+`.
    #[serde(default = "default_country_prefix")]
    pub country_prefix: String,

    /// Rate-limited SMS failures tolerated before email becomes mandatory.
    #[serde(default = "default_max_sms_attempts")]
    pub max_sms_attempts: u32,

    /// Window after which the SMS failure counter resets.
    #[serde(default = "default_rate_limit_window", with = "humantime_serde")]
    pub rate_limit_window: Duration,

    /// How long an emailed code stays valid.
    #[serde(default = "default_email_code_ttl", with = "humantime_serde")]
    pub email_code_ttl: Duration,

    /// Phone-auth backend.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Transactional email relay.
    #[serde(default)]
    pub email: EmailJsConfig,

    /// Optional legacy SMS vendor.
    pub sms: Option<SmsVendorConfig>,
}

fn default_country_prefix() -> String {
    "+91".into()
}

fn default_max_sms_attempts() -> u32 {
    3
}

fn default_rate_limit_window() -> Duration {
    Duration::from_secs(60 * 60) // 60 minutes
}

fn default_email_code_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            country_prefix: default_country_prefix(),
            max_sms_attempts: default_max_sms_attempts(),
            rate_limit_window: default_rate_limit_window(),
            email_code_ttl: default_email_code_ttl(),
            identity: IdentityConfig::default(),
            email: EmailJsConfig::default(),
            sms: None,
        }
    }
}

/// Identity Toolkit (phone auth) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// REST base URL.
    #[serde(default = "default_identity_url")]
    pub base_url: String,

    /// Web API key of the auth project.
    #[serde(default)]
    pub api_key: String,

    /// Request timeout; the phone verification window.
    #[serde(default = "default_identity_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com".into()
}

fn default_identity_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_url(),
            api_key: String::new(),
            timeout: default_identity_timeout(),
        }
    }
}

/// EmailJS relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailJsConfig {
    /// REST base URL.
    #[serde(default = "default_emailjs_url")]
    pub base_url: String,

    #[serde(default)]
    pub service_id: String,

    #[serde(default)]
    pub template_id: String,

    /// Public key of the EmailJS account.
    #[serde(default)]
    pub user_id: String,

    /// Private access token, required when strict mode is on.
    pub access_token: Option<String>,

    /// Name shown in the email template.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_email_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_emailjs_url() -> String {
    "https://api.emailjs.com".into()
}

fn default_app_name() -> String {
    "Cafe Checkout".into()
}

fn default_email_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            base_url: default_emailjs_url(),
            service_id: String::new(),
            template_id: String::new(),
            user_id: String::new(),
            access_token: None,
            app_name: default_app_name(),
            timeout: default_email_timeout(),
        }
    }
}

/// Legacy SMS vendor selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "vendor", rename_all = "snake_case")]
pub enum SmsVendorConfig {
    /// MSG91 OTP API.
    Msg91 {
        #[serde(default = "default_msg91_url")]
        base_url: String,
        auth_key: String,
        template_id: String,
    },
    /// 2Factor.in OTP API.
    TwoFactor {
        #[serde(default = "default_two_factor_url")]
        base_url: String,
        api_key: String,
        #[serde(default = "default_two_factor_template")]
        template: String,
    },
}

fn default_msg91_url() -> String {
    "https://control.msg91.com".into()
}

fn default_two_factor_url() -> String {
    "https://2factor.in".into()
}

fn default_two_factor_template() -> String {
    "OTP1".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = OtpConfig::default();
        assert_eq!(config.country_prefix, "+91");
        assert_eq!(config.max_sms_attempts, 3);
        assert_eq!(config.rate_limit_window, Duration::from_secs(3600));
        assert!(config.sms.is_none());
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let config: OtpConfig = serde_json::from_value(serde_json::json!({
            "max_sms_attempts": 5,
            "rate_limit_window": "30m",
            "email_code_ttl": "5m",
        }))
        .unwrap();

        assert_eq!(config.max_sms_attempts, 5);
        assert_eq!(config.rate_limit_window, Duration::from_secs(30 * 60));
        assert_eq!(config.email_code_ttl, Duration::from_secs(5 * 60));
        assert_eq!(config.identity.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_sms_vendor() {
        let config: SmsVendorConfig = serde_json::from_value(serde_json::json!({
            "vendor": "two_factor",
            "api_key": "key",
        }))
        .unwrap();

        match config {
            SmsVendorConfig::TwoFactor {
                base_url, template, ..
            } => {
                assert_eq!(base_url, "https://2factor.in");
                assert_eq!(template, "OTP1");
            }
            other => panic!("unexpected vendor: {:?}", other),
        }
    }
}
