//! Core OTP types.

use serde::{Deserialize, Serialize};

/// Number of digits in every one-time code.
pub const CODE_LENGTH: usize = 6;

/// Message returned when the platform verified the phone without a code.
pub const AUTO_VERIFIED_MESSAGE: &str = "auto-verified";

/// Delivery channel of a one-time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    /// SMS issued through the phone-auth backend.
    PhoneSms,
    /// Email carrying a locally generated code.
    Email,
    /// SMS issued through a legacy vendor (MSG91, 2Factor).
    GenericSms,
}

impl std::fmt::Display for OtpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpChannel::PhoneSms => write!(f, "phone SMS"),
            OtpChannel::Email => write!(f, "email"),
            OtpChannel::GenericSms => write!(f, "SMS"),
        }
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    /// Human-readable status, or [`AUTO_VERIFIED_MESSAGE`].
    pub message: String,
    /// Channel that carried the code.
    pub channel: OtpChannel,
}

impl SendReceipt {
    pub fn new(message: impl Into<String>, channel: OtpChannel) -> Self {
        Self {
            message: message.into(),
            channel,
        }
    }

    /// Whether the platform completed verification on its own.
    pub fn is_auto_verified(&self) -> bool {
        self.message == AUTO_VERIFIED_MESSAGE
    }
}

/// Check that a code is exactly six ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("000000"));
        assert!(is_valid_code("123456"));

        assert!(!is_valid_code(""));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("12a456"));
        assert!(!is_valid_code(" 23456"));
        // Non-ASCII digits must not pass
        assert!(!is_valid_code("١٢٣٤٥٦"));
    }

    #[test]
    fn test_channel_serialization() {
        let json = serde_json::to_string(&OtpChannel::PhoneSms).unwrap();
        assert_eq!(json, "\"phone_sms\"");

        let json = serde_json::to_string(&OtpChannel::GenericSms).unwrap();
        assert_eq!(json, "\"generic_sms\"");
    }

    #[test]
    fn test_auto_verified_receipt() {
        let receipt = SendReceipt::new(AUTO_VERIFIED_MESSAGE, OtpChannel::PhoneSms);
        assert!(receipt.is_auto_verified());

        let receipt = SendReceipt::new("OTP sent", OtpChannel::PhoneSms);
        assert!(!receipt.is_auto_verified());
    }
}
