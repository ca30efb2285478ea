//! EmailJS transactional email relay.

use super::EmailRelay;
use crate::config::EmailJsConfig;
use crate::error::OtpError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// EmailJS REST relay delivering OTP emails through a template.
pub struct EmailJsRelay {
    client: Client,
    base_url: String,
    service_id: String,
    template_id: String,
    user_id: String,
    access_token: Option<SecretString>,
    app_name: String,
    valid_minutes: u64,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    passcode: &'a str,
    app_name: &'a str,
    valid_minutes: u64,
}

impl EmailJsRelay {
    /// Build the relay from configuration. `code_ttl` is rendered into the
    /// template so the email states how long the code is valid.
    pub fn from_config(config: &EmailJsConfig, code_ttl: Duration) -> Result<Self, OtpError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OtpError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            user_id: config.user_id.clone(),
            access_token: config.access_token.clone().map(SecretString::new),
            app_name: config.app_name.clone(),
            valid_minutes: code_ttl.as_secs() / 60,
        })
    }
}

#[async_trait]
impl EmailRelay for EmailJsRelay {
    #[instrument(skip(self, code))]
    async fn send_code(&self, email: &str, code: &str) -> Result<(), String> {
        let request = SendEmailRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.user_id,
            access_token: self.access_token.as_ref().map(|t| t.expose_secret().as_str()),
            template_params: TemplateParams {
                to_email: email,
                passcode: code,
                app_name: &self.app_name,
                valid_minutes: self.valid_minutes,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // EmailJS answers exactly "OK" with 200 on success
        if status == StatusCode::OK && body.trim() == "OK" {
            debug!("OTP email accepted by relay");
            return Ok(());
        }

        warn!(status = %status, body = %body, "Email relay rejected OTP email");
        Err(if body.is_empty() {
            status.to_string()
        } else {
            body
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_relay(server: &MockServer) -> EmailJsRelay {
        let config = EmailJsConfig {
            base_url: server.uri(),
            service_id: "service_1".into(),
            template_id: "template_otp".into(),
            user_id: "public-key".into(),
            access_token: Some("private-token".into()),
            ..EmailJsConfig::default()
        };
        EmailJsRelay::from_config(&config, Duration::from_secs(600)).unwrap()
    }

    #[tokio::test]
    async fn test_send_code_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .and(body_partial_json(serde_json::json!({
                "service_id": "service_1",
                "template_id": "template_otp",
                "user_id": "public-key",
                "accessToken": "private-token",
                "template_params": {
                    "to_email": "a@b.com",
                    "passcode": "042137",
                    "valid_minutes": 10
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(test_relay(&server).send_code("a@b.com", "042137").await.is_ok());
    }

    #[tokio::test]
    async fn test_send_code_rejected_carries_relay_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("The Public Key is invalid"),
            )
            .mount(&server)
            .await;

        let result = test_relay(&server).send_code("a@b.com", "042137").await;
        assert_eq!(result, Err("The Public Key is invalid".to_string()));
    }

    #[tokio::test]
    async fn test_200_without_ok_body_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Queued"))
            .mount(&server)
            .await;

        assert!(test_relay(&server).send_code("a@b.com", "042137").await.is_err());
    }
}
