//! MSG91 OTP API client.

use super::SmsGateway;
use crate::error::OtpError;
use crate::phone::digits_only;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// MSG91 legacy SMS vendor.
pub struct Msg91Gateway {
    client: Client,
    base_url: String,
    auth_key: SecretString,
    template_id: String,
}

/// MSG91 answers `{"type": "success" | "error", "message": "..."}`.
#[derive(Debug, Deserialize)]
struct Msg91Response {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

impl Msg91Response {
    fn is_success(&self) -> bool {
        self.kind.eq_ignore_ascii_case("success")
    }
}

impl Msg91Gateway {
    pub fn new(
        base_url: impl Into<String>,
        auth_key: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Result<Self, OtpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OtpError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_key: SecretString::new(auth_key.into()),
            template_id: template_id.into(),
        })
    }

    async fn parse(response: reqwest::Response) -> Result<Msg91Response, String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str(&body).map_err(|_| {
            warn!(status = %status, body = %body, "Unexpected MSG91 response");
            format!("{} - {}", status, body)
        })
    }
}

#[async_trait]
impl SmsGateway for Msg91Gateway {
    #[instrument(skip(self))]
    async fn send(&self, phone_number: &str) -> Result<(), String> {
        let url = format!(
            "{}/api/v5/otp?template_id={}&mobile={}",
            self.base_url,
            encode(&self.template_id),
            encode(digits_only(phone_number))
        );

        let response = self
            .client
            .post(&url)
            .header("authkey", self.auth_key.expose_secret())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let reply = Self::parse(response).await?;
        if reply.is_success() {
            debug!("MSG91 accepted OTP request");
            Ok(())
        } else {
            warn!(message = %reply.message, "MSG91 send failed");
            Err(reply.message)
        }
    }

    #[instrument(skip(self, code))]
    async fn verify(&self, phone_number: &str, code: &str) -> Result<bool, String> {
        let url = format!(
            "{}/api/v5/otp/verify?otp={}&mobile={}",
            self.base_url,
            encode(code),
            encode(digits_only(phone_number))
        );

        let response = self
            .client
            .get(&url)
            .header("authkey", self.auth_key.expose_secret())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let reply = Self::parse(response).await?;
        debug!(kind = %reply.kind, message = %reply.message, "MSG91 verify response");
        Ok(reply.is_success())
    }
}
