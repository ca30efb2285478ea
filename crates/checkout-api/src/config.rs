//! Configuration for the checkout API.

use anyhow::{Context, Result};
use otp_coordinator::OtpConfig;
use payment_dispatch::DispatchConfig;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// OTP channel policy and backends
    #[serde(default)]
    pub otp: OtpConfig,

    /// Login session limits
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Merchant and gateway configuration
    #[serde(default)]
    pub payments: DispatchConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accept cross-origin requests from any origin
    #[serde(default)]
    pub allow_any_origin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,

    /// OTP sends per minute across all callers
    #[serde(default = "default_otp_send_rpm")]
    pub otp_send_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Drop a login session unused for this long
    #[serde(default = "default_session_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// Live login sessions before new ones are refused
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            allow_any_origin: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
            otp_send_per_minute: default_otp_send_rpm(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: default_session_idle_timeout(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_global_rpm() -> u32 {
    120
}

fn default_otp_send_rpm() -> u32 {
    20
}

fn default_session_idle_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nested keys use `__`, e.g. `OTP__MAX_SMS_ATTEMPTS=5` or
    /// `PAYMENTS__STRIPE__KEY_ID=pk_live_..`. `PAYMENTS__INSTALLED_APPS` is a
    /// comma-separated list.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("payments.installed_apps")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
