//! HTTP request handlers.

use super::types::{
    CreatePaymentRequest, GatewayInfo, GatewaysResponse, HealthResponse, LegacySmsRequest,
    OtpStatusResponse, PaymentResponse, SendCodeRequest, SendCodeResponse,
    SessionCreatedResponse, VerifyCodeRequest, VerifyCodeResponse,
};
use super::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use payment_dispatch::{FixedChoice, GatewayId, PaymentError, PaymentResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        gateways: state.payments.registry().len(),
    })
}

/// Start a login session.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), ApiError> {
    let (session_id, otp) = state.otp.create().await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id,
            remaining_attempts: otp.remaining_attempts().await,
            max_attempts: otp.config().max_sms_attempts,
        }),
    ))
}

/// Issue a login code by SMS, or by email once SMS is exhausted.
pub async fn send_code(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    let otp = state.otp.get(&session_id).await?;
    let receipt = otp
        .send_code(request.phone.as_deref(), request.email.as_deref())
        .await?;

    info!(channel = %receipt.channel, "Login code issued");

    Ok(Json(SendCodeResponse {
        auto_verified: receipt.is_auto_verified(),
        message: receipt.message,
        channel: receipt.channel,
        remaining_attempts: otp.remaining_attempts().await,
    }))
}

/// Issue a login code through the legacy SMS vendor.
pub async fn send_legacy_sms(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<LegacySmsRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    let otp = state.otp.get(&session_id).await?;
    let receipt = otp.send_legacy_sms(&request.phone).await?;

    Ok(Json(SendCodeResponse {
        auto_verified: false,
        message: receipt.message,
        channel: receipt.channel,
        remaining_attempts: otp.remaining_attempts().await,
    }))
}

/// Check a login code.
pub async fn verify_code(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, ApiError> {
    let otp = state.otp.get(&session_id).await?;
    let channel = otp
        .verify_code(
            request.phone.as_deref(),
            request.email.as_deref(),
            &request.code,
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Code verification failed"))?;

    info!(%channel, "Login code verified");

    Ok(Json(VerifyCodeResponse {
        verified: true,
        channel,
    }))
}

/// Drop the session's outstanding code and SMS failure count.
pub async fn reset_otp(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.otp.get(&session_id).await?.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

/// Current state of one login session.
pub async fn otp_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<OtpStatusResponse>, ApiError> {
    let otp = state.otp.get(&session_id).await?;

    Ok(Json(OtpStatusResponse {
        channel: otp.current_channel().await,
        remaining_attempts: otp.remaining_attempts().await,
        max_attempts: otp.config().max_sms_attempts,
    }))
}

/// End a login session.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.otp.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

/// List registered gateways.
pub async fn list_gateways(State(state): State<AppState>) -> Json<GatewaysResponse> {
    let gateways: Vec<GatewayInfo> = state
        .payments
        .registry()
        .list()
        .iter()
        .map(|profile| GatewayInfo::from(profile.as_ref()))
        .collect();

    Json(GatewaysResponse {
        total: gateways.len(),
        gateways,
    })
}

/// Get one gateway by its wire name.
pub async fn get_gateway(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
) -> Result<Json<GatewayInfo>, ApiError> {
    let id: GatewayId = gateway.parse()?;
    let profile = state
        .payments
        .registry()
        .get(id)
        .ok_or(PaymentError::GatewayNotConfigured(id))?;

    Ok(Json(GatewayInfo::from(profile.as_ref())))
}

/// Run a payment to completion and return every event it produced.
///
/// A declined or cancelled payment is still a 200; the outcome says how
/// the attempt ended.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Json<PaymentResponse> {
    let (request, fallback) = request.into_parts();

    let handle = state
        .payments
        .clone()
        .with_install_prompt(Arc::new(FixedChoice(fallback)))
        .initiate_payment(request);

    let order_id = handle.order_id().to_string();
    let events = handle.collect().await;
    let outcome = events
        .last()
        .filter(|event| event.is_terminal())
        .cloned()
        .unwrap_or_else(|| PaymentResult::failed("payment ended without a result"));

    Json(PaymentResponse {
        order_id,
        events,
        outcome,
    })
}
