//! Error types for the checkout API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use otp_coordinator::OtpError;
use payment_dispatch::PaymentError;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Login session not found or expired")]
    SessionNotFound,

    #[error("Too many login sessions, try again later")]
    TooManySessions,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Otp(e) => match e {
                OtpError::MissingContact => (StatusCode::BAD_REQUEST, "MISSING_CONTACT"),
                OtpError::EmailRequired => (StatusCode::CONFLICT, "EMAIL_REQUIRED"),
                OtpError::SmsRateLimited => (StatusCode::TOO_MANY_REQUESTS, "SMS_RATE_LIMITED"),
                OtpError::InvalidPhoneNumber(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_PHONE_NUMBER")
                }
                OtpError::InvalidCodeFormat => (StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT"),
                OtpError::InvalidOtp => (StatusCode::UNAUTHORIZED, "INVALID_OTP"),
                OtpError::InvalidEmailOtp => (StatusCode::UNAUTHORIZED, "INVALID_EMAIL_OTP"),
                OtpError::CodeExpired => (StatusCode::GONE, "CODE_EXPIRED"),
                OtpError::NoVerificationInProgress => {
                    (StatusCode::CONFLICT, "NO_VERIFICATION_IN_PROGRESS")
                }
                OtpError::PhoneRequired => (StatusCode::BAD_REQUEST, "PHONE_REQUIRED"),
                OtpError::ContactMismatch => (StatusCode::UNAUTHORIZED, "CONTACT_MISMATCH"),
                OtpError::EmailDelivery(_) => (StatusCode::BAD_GATEWAY, "EMAIL_DELIVERY_FAILED"),
                OtpError::NotConfigured(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_CONFIGURED"),
                OtpError::Backend(_) => (StatusCode::BAD_GATEWAY, "OTP_BACKEND_ERROR"),
            },
            ApiError::Payment(e) => match e {
                PaymentError::GatewayNotConfigured(_) => {
                    (StatusCode::NOT_FOUND, "GATEWAY_NOT_CONFIGURED")
                }
                PaymentError::UnknownGateway(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_GATEWAY"),
                PaymentError::InsufficientBalance { .. } => {
                    (StatusCode::PAYMENT_REQUIRED, "INSUFFICIENT_BALANCE")
                }
                PaymentError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
                PaymentError::AppLaunch(_)
                | PaymentError::Processor(_)
                | PaymentError::BalanceLookup(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_ERROR"),
            },
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ApiError::TooManySessions => (StatusCode::SERVICE_UNAVAILABLE, "TOO_MANY_SESSIONS"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
