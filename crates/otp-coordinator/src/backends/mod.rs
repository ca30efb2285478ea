//! External collaborators of the coordinator.
//!
//! Each backend is a trait so the coordinator can be driven by the real HTTP
//! clients in production and by mocks in tests.

mod email;
mod identity;
mod msg91;
mod two_factor;

pub use email::EmailJsRelay;
pub use identity::IdentityToolkitClient;
pub use msg91::Msg91Gateway;
pub use two_factor::TwoFactorGateway;

use async_trait::async_trait;
use thiserror::Error;

/// Successful outcome of starting a phone verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneVerification {
    /// The platform verified the number without a code.
    AutoVerified,
    /// A code was sent; the id identifies this verification.
    CodeSent { verification_id: String },
}

/// Failure kinds reported by the phone-auth backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneAuthError {
    /// SMS quota or rate limit hit.
    #[error("too many requests")]
    TooManyRequests,

    /// Bad phone number or bad code.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Other(String),
}

/// Phone-auth backend issuing and checking SMS codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhoneAuthBackend: Send + Sync {
    /// Start a verification for an E.164 number.
    ///
    /// Resolves exactly once with either a verification handle or an error.
    async fn start_verification(
        &self,
        phone_number: &str,
    ) -> Result<PhoneVerification, PhoneAuthError>;

    /// Exchange a verification id and code for a sign-in credential.
    async fn sign_in(&self, verification_id: &str, code: &str) -> Result<(), PhoneAuthError>;
}

/// Transactional email relay. It cannot check codes itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailRelay: Send + Sync {
    /// Deliver `code` to `email`. The error carries the relay's text.
    async fn send_code(&self, email: &str, code: &str) -> Result<(), String>;
}

/// Legacy SMS vendor that both issues and checks codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone_number: &str) -> Result<(), String>;

    /// `Ok(false)` means the vendor answered and rejected the code.
    async fn verify(&self, phone_number: &str, code: &str) -> Result<bool, String>;
}
