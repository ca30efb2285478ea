//! API request and response types.

use otp_coordinator::OtpChannel;
use payment_dispatch::{
    Environment, GatewayId, GatewayKind, GatewayProfile, InstallChoice, PaymentRequest,
    PaymentResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to issue a login code.
#[derive(Debug, Default, Deserialize)]
pub struct SendCodeRequest {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Response after a code was issued.
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub message: String,
    pub channel: OtpChannel,
    /// The phone was verified without a code; no verify call is needed.
    pub auto_verified: bool,
    pub remaining_attempts: u32,
}

/// Request to issue a code through the legacy SMS vendor.
#[derive(Debug, Deserialize)]
pub struct LegacySmsRequest {
    pub phone: String,
}

/// Request to check a code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub code: String,
}

/// Response after a successful check.
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
    pub channel: OtpChannel,
}

/// A login session was started.
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    /// Quote this id on every later OTP call.
    pub session_id: String,
    pub remaining_attempts: u32,
    pub max_attempts: u32,
}

/// Current state of one login session.
#[derive(Debug, Serialize)]
pub struct OtpStatusResponse {
    /// Channel with a code outstanding, if any.
    pub channel: Option<OtpChannel>,
    pub remaining_attempts: u32,
    pub max_attempts: u32,
}

/// Checkout request: a payment request plus the answer to give if the
/// wallet app is missing.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub gateway: GatewayId,
    pub amount: u64,
    pub order_id: Option<String>,
    pub customer_id: String,
    pub customer_email: Option<String>,
    pub customer_mobile: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
    /// Defaults to `cancel`.
    pub fallback: Option<InstallChoice>,
}

impl CreatePaymentRequest {
    pub fn into_parts(self) -> (PaymentRequest, InstallChoice) {
        let fallback = self.fallback.unwrap_or(InstallChoice::Cancel);
        let request = PaymentRequest {
            gateway: self.gateway,
            amount: self.amount,
            order_id: self.order_id,
            customer_id: self.customer_id,
            customer_email: self.customer_email,
            customer_mobile: self.customer_mobile,
            extra: self.extra,
        };
        (request, fallback)
    }
}

/// Every event of a finished payment attempt.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub order_id: String,
    pub events: Vec<PaymentResult>,
    pub outcome: PaymentResult,
}

/// Public view of a gateway profile.
#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub gateway: GatewayId,
    pub display_name: String,
    pub kind: GatewayKind,
    pub app_package: Option<String>,
    pub environment: Environment,
}

impl From<&GatewayProfile> for GatewayInfo {
    fn from(profile: &GatewayProfile) -> Self {
        Self {
            gateway: profile.gateway_id,
            display_name: profile.display_name.clone(),
            kind: profile.kind(),
            app_package: profile.app_package.clone(),
            environment: profile.environment,
        }
    }
}

/// Registered gateways.
#[derive(Debug, Serialize)]
pub struct GatewaysResponse {
    pub gateways: Vec<GatewayInfo>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub gateways: usize,
}
