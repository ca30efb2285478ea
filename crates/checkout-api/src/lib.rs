//! Checkout API - OTP login and unified payments over HTTP.
//!
//! This service wires the two checkout components together:
//! - [`otp_coordinator`] issues and verifies login codes, falling back from
//!   SMS to email once the SMS quota runs out
//! - [`payment_dispatch`] routes a checkout to a wallet app, a remote
//!   processor or a cash / stored-balance tender

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;

pub use config::Config;
pub use error::ApiError;
pub use sessions::OtpSessions;
