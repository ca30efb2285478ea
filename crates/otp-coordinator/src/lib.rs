//! One-time-password verification for customer login.
//!
//! The coordinator picks a delivery channel for each login attempt, issues the
//! code through it, and checks the code the customer types back.
//!
//! # Channels
//!
//! ```text
//! phone given, SMS quota left  → phone-auth backend (PhoneSms)
//! SMS quota exhausted          → email relay, locally generated code (Email)
//! legacy vendor requested      → MSG91 / 2Factor (GenericSms)
//! ```
//!
//! # Modules
//!
//! - [`config`] - Channel policy and backend configuration
//! - [`coordinator`] - The stateful [`OtpCoordinator`]
//! - [`backends`] - Backend traits and their HTTP clients
//! - [`phone`] - Phone number normalization

pub mod backends;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod phone;
mod session;
pub mod types;

// Re-exports for convenience
pub use backends::{
    EmailJsRelay, EmailRelay, IdentityToolkitClient, Msg91Gateway, PhoneAuthBackend,
    PhoneAuthError, PhoneVerification, SmsGateway, TwoFactorGateway,
};
pub use config::{EmailJsConfig, IdentityConfig, OtpConfig, SmsVendorConfig};
pub use coordinator::{OtpBackends, OtpCoordinator};
pub use error::OtpError;
pub use types::{is_valid_code, OtpChannel, SendReceipt, AUTO_VERIFIED_MESSAGE, CODE_LENGTH};
