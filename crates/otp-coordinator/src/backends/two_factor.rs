//! 2Factor.in OTP API client.

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

/// 2Factor legacy SMS vendor. The API key travels in the URL path, so URLs
/// are never logged.
pub struct TwoFactorGateway {
    client: Client,
    base_url: String,
    api_key: SecretString,
    template: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TwoFactorResponse {
    status: String,
    #[serde(default)]
    details: String,
}

impl TwoFactorGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<Self, OtpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OtpError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into()),
            template: template.into(),
        })
    }

    async fn call(&self, path: String) -> Result<TwoFactorResponse, String> {
        let url = format!(
            "{}/API/V1/{}/SMS/{}",
            self.base_url,
            encode(self.api_key.expose_secret()),
            path
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url().to_string())?;
        serde_json::from_str(&body).map_err(|_| {
            warn!(status = %status, "Unexpected 2Factor response");
            format!("{} - {}", status, body)
        })
    }
}

#[async_trait]
impl SmsGateway for TwoFactorGateway {
    #[instrument(skip(self))]
    async fn send(&self, phone_number: &str) -> Result<(), String> {
        let reply = self
            .call(format!(
                "{}/AUTOGEN/{}",
                encode(digits_only(phone_number)),
                encode(&self.template)
            ))
            .await?;

        if reply.status.eq_ignore_ascii_case("success") {
            debug!(session = %reply.details, "2Factor accepted OTP request");
            Ok(())
        } else {
            Err(reply.details)
        }
    }

    #[instrument(skip(self, code))]
    async fn verify(&self, phone_number: &str, code: &str) -> Result<bool, String> {
        let reply = self
            .call(format!(
                "VERIFY3/{}/{}",
                encode(digits_only(phone_number)),
                encode(code)
            ))
            .await?;

        debug!(status = %reply.status, details = %reply.details, "2Factor verify response");
        Ok(reply.status.eq_ignore_ascii_case("success"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_autogen() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/API/V1/key-1/SMS/919876543210/AUTOGEN/OTP1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Status": "Success",
                "Details": "session-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = TwoFactorGateway::new(server.uri(), "key-1", "OTP1").unwrap();
        assert!(gateway.send("+919876543210").await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_matched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/API/V1/key-1/SMS/VERIFY3/919876543210/123456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Status": "Success",
                "Details": "OTP Matched"
            })))
            .mount(&server)
            .await;

        let gateway = TwoFactorGateway::new(server.uri(), "key-1", "OTP1").unwrap();
        assert_eq!(gateway.verify("+919876543210", "123456").await, Ok(true));
    }

    #[tokio::test]
    async fn test_verify_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/API/V1/key-1/SMS/VERIFY3/919876543210/000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Status": "Error",
                "Details": "OTP Mismatch"
            })))
            .mount(&server)
            .await;

        let gateway = TwoFactorGateway::new(server.uri(), "key-1", "OTP1").unwrap();
        assert_eq!(gateway.verify("+919876543210", "000000").await, Ok(false));
    }
}
