//! Identity Toolkit REST client for phone authentication.

use super::{PhoneAuthBackend, PhoneAuthError, PhoneVerification};
use crate::config::IdentityConfig;
use crate::error::OtpError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Phone-auth backend over the Identity Toolkit REST API.
///
/// The API key is stored using `SecretString` so it never shows up in logs.
pub struct IdentityToolkitClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl IdentityToolkitClient {
    /// Create a new client. `timeout` bounds each request, and therefore the
    /// phone verification window.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OtpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OtpError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into()),
        })
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, OtpError> {
        Self::new(&config.base_url, &config.api_key, config.timeout)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.base_url,
            method,
            self.api_key.expose_secret()
        )
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, PhoneAuthError> {
        let response = self
            .client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| PhoneAuthError::Other(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(extract_error(response).await);
        }

        response
            .json::<R>()
            .await
            .map_err(|e| PhoneAuthError::Other(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeRequest<'a> {
    phone_number: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeResponse {
    session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    session_info: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    #[serde(default)]
    local_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

async fn extract_error(response: Response) -> PhoneAuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "Identity Toolkit request failed");

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => classify(&envelope.error.message),
        Err(_) if status == StatusCode::TOO_MANY_REQUESTS => PhoneAuthError::TooManyRequests,
        Err(_) => PhoneAuthError::Other(format!("{} - {}", status, body)),
    }
}

/// Map an Identity Toolkit error message (e.g. `INVALID_CODE : ...`) to a kind.
fn classify(message: &str) -> PhoneAuthError {
    let kind = message.split(':').next().unwrap_or(message).trim();
    match kind {
        "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => PhoneAuthError::TooManyRequests,
        "INVALID_PHONE_NUMBER"
        | "MISSING_PHONE_NUMBER"
        | "INVALID_CODE"
        | "MISSING_CODE"
        | "INVALID_SESSION_INFO"
        | "SESSION_EXPIRED" => PhoneAuthError::InvalidCredentials(message.to_string()),
        _ => PhoneAuthError::Other(message.to_string()),
    }
}

#[async_trait]
impl PhoneAuthBackend for IdentityToolkitClient {
    #[instrument(skip(self))]
    async fn start_verification(
        &self,
        phone_number: &str,
    ) -> Result<PhoneVerification, PhoneAuthError> {
        let response: SendVerificationCodeResponse = self
            .post(
                "sendVerificationCode",
                &SendVerificationCodeRequest { phone_number },
            )
            .await?;

        debug!("Verification code sent");
        Ok(PhoneVerification::CodeSent {
            verification_id: response.session_info,
        })
    }

    #[instrument(skip(self, verification_id, code))]
    async fn sign_in(&self, verification_id: &str, code: &str) -> Result<(), PhoneAuthError> {
        let response: SignInResponse = self
            .post(
                "signInWithPhoneNumber",
                &SignInRequest {
                    session_info: verification_id,
                    code,
                },
            )
            .await?;

        debug!(local_id = ?response.local_id, "Phone sign-in successful");
        Ok(())
    }
}
