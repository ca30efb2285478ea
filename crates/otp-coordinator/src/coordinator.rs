//! The OTP verification coordinator.

use crate::backends::{
    EmailJsRelay, EmailRelay, IdentityToolkitClient, Msg91Gateway, PhoneAuthBackend,
    PhoneAuthError, PhoneVerification, SmsGateway, TwoFactorGateway,
};
use crate::config::{OtpConfig, SmsVendorConfig};
use crate::error::OtpError;
use crate::phone::normalize_phone;
use crate::session::{OtpSession, Pending};
use crate::types::{is_valid_code, OtpChannel, SendReceipt, AUTO_VERIFIED_MESSAGE};
use rand::Rng;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Backend handles shared by every login session.
///
/// Cloning is cheap; each clone points at the same HTTP clients.
#[derive(Clone)]
pub struct OtpBackends {
    phone_auth: Arc<dyn PhoneAuthBackend>,
    email_relay: Arc<dyn EmailRelay>,
    sms_gateway: Option<Arc<dyn SmsGateway>>,
}

impl OtpBackends {
    pub fn new(phone_auth: Arc<dyn PhoneAuthBackend>, email_relay: Arc<dyn EmailRelay>) -> Self {
        Self {
            phone_auth,
            email_relay,
            sms_gateway: None,
        }
    }

    /// Attach a legacy SMS vendor.
    pub fn with_sms_gateway(mut self, gateway: Arc<dyn SmsGateway>) -> Self {
        self.sms_gateway = Some(gateway);
        self
    }

    /// Build the HTTP backends named in `config`.
    pub fn from_config(config: &OtpConfig) -> Result<Self, OtpError> {
        let phone_auth = Arc::new(IdentityToolkitClient::from_config(&config.identity)?);
        let email_relay = Arc::new(EmailJsRelay::from_config(
            &config.email,
            config.email_code_ttl,
        )?);

        let sms_gateway: Option<Arc<dyn SmsGateway>> = match &config.sms {
            Some(SmsVendorConfig::Msg91 {
                base_url,
                auth_key,
                template_id,
            }) => Some(Arc::new(Msg91Gateway::new(base_url, auth_key, template_id)?)),
            Some(SmsVendorConfig::TwoFactor {
                base_url,
                api_key,
                template,
            }) => Some(Arc::new(TwoFactorGateway::new(base_url, api_key, template)?)),
            None => None,
        };

        let backends = Self::new(phone_auth, email_relay);
        Ok(match sms_gateway {
            Some(gateway) => backends.with_sms_gateway(gateway),
            None => backends,
        })
    }

    /// A fresh coordinator with an empty session.
    pub fn coordinator(&self, config: OtpConfig) -> OtpCoordinator {
        OtpCoordinator {
            config,
            backends: self.clone(),
            session: Mutex::new(OtpSession::default()),
        }
    }
}

/// Issues and verifies one-time codes for a single login session.
///
/// The session lock is held for the whole of each call, so concurrent
/// `send_code` / `verify_code` calls on one coordinator run one after another.
/// Separate login sessions need separate coordinators; build them from one
/// [`OtpBackends`].
pub struct OtpCoordinator {
    config: OtpConfig,
    backends: OtpBackends,
    session: Mutex<OtpSession>,
}

impl OtpCoordinator {
    pub fn new(
        config: OtpConfig,
        phone_auth: Arc<dyn PhoneAuthBackend>,
        email_relay: Arc<dyn EmailRelay>,
    ) -> Self {
        OtpBackends::new(phone_auth, email_relay).coordinator(config)
    }

    /// Attach a legacy SMS vendor.
    pub fn with_sms_gateway(mut self, gateway: Arc<dyn SmsGateway>) -> Self {
        self.backends.sms_gateway = Some(gateway);
        self
    }

    /// Build a coordinator wired to the HTTP backends named in `config`.
    pub fn from_config(config: OtpConfig) -> Result<Self, OtpError> {
        Ok(OtpBackends::from_config(&config)?.coordinator(config))
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Pick a channel and issue a code.
    ///
    /// Once the SMS quota is exhausted within the rate-limit window, email is
    /// the only channel and becomes mandatory.
    #[instrument(skip(self))]
    pub async fn send_code(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<SendReceipt, OtpError> {
        let phone = non_empty(phone);
        let email = non_empty(email);

        if phone.is_none() && email.is_none() {
            return Err(OtpError::MissingContact);
        }

        let mut session = self.session.lock().await;

        if session.sms_exhausted(
            self.config.max_sms_attempts,
            Instant::now(),
            self.config.rate_limit_window,
        ) {
            let email = email.ok_or(OtpError::EmailRequired)?;
            info!("SMS attempts exhausted, routing code to email");
            return self.send_email(&mut session, email).await;
        }

        if let Some(phone) = phone {
            return self.send_phone(&mut session, phone).await;
        }

        match email {
            Some(email) => self.send_email(&mut session, email).await,
            None => Err(OtpError::MissingContact),
        }
    }

    /// Issue a code through the legacy SMS vendor.
    #[instrument(skip(self))]
    pub async fn send_legacy_sms(&self, phone: &str) -> Result<SendReceipt, OtpError> {
        let gateway = self
            .backends
            .sms_gateway
            .as_ref()
            .ok_or(OtpError::NotConfigured("SMS gateway"))?;
        let phone = normalize_phone(phone, &self.config.country_prefix)
            .map_err(OtpError::InvalidPhoneNumber)?;

        let mut session = self.session.lock().await;
        session.clear_pending();

        gateway.send(&phone).await.map_err(OtpError::Backend)?;

        info!(phone_number = %phone, "OTP sent by legacy SMS");
        let message = format!("OTP sent to {}", phone);
        session.begin(Pending::LegacySms { phone });
        Ok(SendReceipt::new(message, OtpChannel::GenericSms))
    }

    /// Check a code against the pending verification.
    ///
    /// The contact for the pending channel must be the one the code was sent
    /// to. Returns the channel that verified. A failed check leaves the
    /// pending verification in place so the customer can retry.
    #[instrument(skip(self, code))]
    pub async fn verify_code(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
        code: &str,
    ) -> Result<OtpChannel, OtpError> {
        if !is_valid_code(code) {
            return Err(OtpError::InvalidCodeFormat);
        }

        let mut session = self.session.lock().await;
        let pending = session
            .pending()
            .cloned()
            .ok_or(OtpError::NoVerificationInProgress)?;
        self.check_contact(&pending, phone, email)?;

        match pending {
            Pending::Phone {
                verification_id,
                phone,
            } => match self.backends.phone_auth.sign_in(&verification_id, code).await {
                Ok(()) => {
                    session.clear_pending();
                    info!(phone_number = %phone, "Phone OTP verified");
                    Ok(OtpChannel::PhoneSms)
                }
                Err(PhoneAuthError::InvalidCredentials(detail)) => {
                    debug!(detail = %detail, "Phone OTP rejected");
                    Err(OtpError::InvalidOtp)
                }
                Err(e) => {
                    warn!(error = %e, "Phone OTP verification failed");
                    Err(OtpError::Backend(e.to_string()))
                }
            },
            Pending::Email {
                code: expected,
                issued_at,
                email,
            } => {
                if issued_at.elapsed() >= self.config.email_code_ttl {
                    session.clear_pending();
                    return Err(OtpError::CodeExpired);
                }

                if bool::from(expected.as_bytes().ct_eq(code.as_bytes())) {
                    session.clear_pending();
                    info!(email = %email, "Email OTP verified");
                    Ok(OtpChannel::Email)
                } else {
                    Err(OtpError::InvalidEmailOtp)
                }
            }
            Pending::LegacySms { phone } => {
                let gateway = self
                    .backends
                    .sms_gateway
                    .as_ref()
                    .ok_or(OtpError::NotConfigured("SMS gateway"))?;

                match gateway.verify(&phone, code).await {
                    Ok(true) => {
                        session.clear_pending();
                        info!(phone_number = %phone, "Legacy SMS OTP verified");
                        Ok(OtpChannel::GenericSms)
                    }
                    Ok(false) => Err(OtpError::InvalidOtp),
                    Err(detail) => Err(OtpError::Backend(detail)),
                }
            }
        }
    }

    /// Drop any pending verification and the SMS attempt counter.
    pub async fn reset(&self) {
        self.session.lock().await.reset();
        debug!("OTP session reset");
    }

    /// SMS sends left before email becomes mandatory.
    pub async fn remaining_attempts(&self) -> u32 {
        self.session.lock().await.remaining_attempts(
            self.config.max_sms_attempts,
            Instant::now(),
            self.config.rate_limit_window,
        )
    }

    /// Channel of the verification in progress, if any.
    pub async fn current_channel(&self) -> Option<OtpChannel> {
        self.session.lock().await.channel()
    }

    /// Reject a verify call naming a contact other than the one the pending
    /// code went to.
    fn check_contact(
        &self,
        pending: &Pending,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), OtpError> {
        let matches = match pending {
            Pending::Phone { phone: sent_to, .. } | Pending::LegacySms { phone: sent_to } => {
                let phone = non_empty(phone).ok_or(OtpError::PhoneRequired)?;
                let phone = normalize_phone(phone, &self.config.country_prefix)
                    .map_err(OtpError::InvalidPhoneNumber)?;
                phone == *sent_to
            }
            Pending::Email { email: sent_to, .. } => {
                let email = non_empty(email).ok_or(OtpError::MissingContact)?;
                email.eq_ignore_ascii_case(sent_to)
            }
        };

        if matches {
            Ok(())
        } else {
            warn!(channel = %pending.channel(), "Code submitted for a different contact");
            Err(OtpError::ContactMismatch)
        }
    }

    async fn send_phone(
        &self,
        session: &mut OtpSession,
        phone: &str,
    ) -> Result<SendReceipt, OtpError> {
        let phone = normalize_phone(phone, &self.config.country_prefix)
            .map_err(OtpError::InvalidPhoneNumber)?;
        session.clear_pending();

        match self.backends.phone_auth.start_verification(&phone).await {
            Ok(PhoneVerification::AutoVerified) => {
                info!(phone_number = %phone, "Phone number verified automatically");
                Ok(SendReceipt::new(AUTO_VERIFIED_MESSAGE, OtpChannel::PhoneSms))
            }
            Ok(PhoneVerification::CodeSent { verification_id }) => {
                info!(phone_number = %phone, "OTP sent by SMS");
                let message = format!("OTP sent to {}", phone);
                session.begin(Pending::Phone {
                    verification_id,
                    phone,
                });
                Ok(SendReceipt::new(message, OtpChannel::PhoneSms))
            }
            Err(PhoneAuthError::TooManyRequests) => {
                session.record_rate_limited(Instant::now());
                warn!(phone_number = %phone, "SMS rate limit reached");
                Err(OtpError::SmsRateLimited)
            }
            Err(PhoneAuthError::InvalidCredentials(detail)) => {
                Err(OtpError::InvalidPhoneNumber(detail))
            }
            Err(PhoneAuthError::Other(detail)) => Err(OtpError::Backend(detail)),
        }
    }

    async fn send_email(
        &self,
        session: &mut OtpSession,
        email: &str,
    ) -> Result<SendReceipt, OtpError> {
        session.clear_pending();

        let code = generate_code();
        self.backends
            .email_relay
            .send_code(email, &code)
            .await
            .map_err(OtpError::EmailDelivery)?;

        session.begin(Pending::Email {
            code,
            issued_at: Instant::now(),
            email: email.to_string(),
        });

        info!(email = %email, "OTP sent by email");
        Ok(SendReceipt::new(
            format!("OTP sent to {}", email),
            OtpChannel::Email,
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Uniformly random six-digit code, zero padded.
fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}
