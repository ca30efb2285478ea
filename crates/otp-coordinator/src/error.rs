//! OTP error types.

use thiserror::Error;

/// Errors surfaced by the OTP coordinator.
///
/// Every variant renders a message that can be shown to the customer as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// Neither a phone number nor an email was supplied.
    #[error("Phone number or email is required")]
    MissingContact,

    /// The SMS quota is exhausted and no email was supplied.
    #[error("Email required: SMS limit reached, please verify via email")]
    EmailRequired,

    /// The phone-auth backend reported a quota / rate limit.
    #[error("Too many SMS requests. Please use email verification instead.")]
    SmsRateLimited,

    /// The phone number was rejected locally or by the backend.
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// The submitted code is not six ASCII digits.
    #[error("OTP must be exactly 6 digits")]
    InvalidCodeFormat,

    /// The SMS code was rejected.
    #[error("Invalid OTP")]
    InvalidOtp,

    /// The email code did not match.
    #[error("Invalid email OTP")]
    InvalidEmailOtp,

    /// The email code outlived its validity window.
    #[error("OTP has expired, please request a new one")]
    CodeExpired,

    /// Verify was called with nothing pending.
    #[error("No verification in progress")]
    NoVerificationInProgress,

    /// SMS verification needs the phone number the code was sent to.
    #[error("Phone number is required for SMS verification")]
    PhoneRequired,

    /// The code was issued to a different phone number or email.
    #[error("This code was not sent to that phone number or email")]
    ContactMismatch,

    /// The email relay did not accept the message.
    #[error("Failed to send email OTP: {0}")]
    EmailDelivery(String),

    /// An optional backend is missing.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Network or backend failure.
    #[error("Verification failed: {0}")]
    Backend(String),
}

impl From<reqwest::Error> for OtpError {
    fn from(e: reqwest::Error) -> Self {
        OtpError::Backend(e.to_string())
    }
}
