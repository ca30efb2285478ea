//! HTTP API for OTP login and checkout.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{
    code_issue_limit_middleware, logging_middleware, rate_limit_middleware, RateLimitState,
};
pub use types::*;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use crate::sessions::OtpSessions;
use payment_dispatch::PaymentDispatcher;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Login sessions, each with its own code coordinator
    pub otp: Arc<OtpSessions>,
    /// Payment dispatcher
    pub payments: PaymentDispatcher,
}

impl AppState {
    /// Create new application state.
    pub fn new(otp: OtpSessions, payments: PaymentDispatcher) -> Self {
        Self {
            otp: Arc::new(otp),
            payments,
        }
    }
}

/// Create the API router with default rate limits.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(120, 20))
}

/// Create the API router with custom rate limits.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let code_issue = Router::new()
        .route("/v1/otp/sessions", post(handlers::create_session))
        .route("/v1/otp/sessions/:session_id/send", post(handlers::send_code))
        .route("/v1/otp/sessions/:session_id/sms", post(handlers::send_legacy_sms))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit.clone(),
            code_issue_limit_middleware,
        ));

    let v1 = Router::new()
        .route(
            "/v1/otp/sessions/:session_id",
            get(handlers::otp_status).delete(handlers::end_session),
        )
        .route("/v1/otp/sessions/:session_id/verify", post(handlers::verify_code))
        .route("/v1/otp/sessions/:session_id/reset", post(handlers::reset_otp))
        .route("/v1/payments", post(handlers::create_payment))
        .route("/v1/payments/gateways", get(handlers::list_gateways))
        .route("/v1/payments/gateways/:gateway", get(handlers::get_gateway))
        .merge(code_issue)
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(v1)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow browser clients from any origin.
pub fn with_permissive_cors(router: Router) -> Router {
    router.layer(CorsLayer::permissive())
}
