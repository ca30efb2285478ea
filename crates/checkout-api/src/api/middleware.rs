//! Rate limiting and request logging.

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

/// Unkeyed limiter shared by every caller.
pub type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Limiters shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    /// Applies to every `/v1` request
    pub global: Arc<DirectLimiter>,
    /// Applies only to routes that send a code
    pub code_issue: Arc<DirectLimiter>,
}

impl RateLimitState {
    pub fn new(global_per_minute: u32, code_issue_per_minute: u32) -> Self {
        Self {
            global: Arc::new(per_minute(global_per_minute)),
            code_issue: Arc::new(per_minute(code_issue_per_minute)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.global_per_minute, config.otp_send_per_minute)
    }

    /// Limits high enough for tests.
    pub fn permissive() -> Self {
        Self::new(10_000, 10_000)
    }
}

fn per_minute(limit: u32) -> DirectLimiter {
    RateLimiter::direct(Quota::per_minute(
        NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN),
    ))
}

/// Rejects with 429 once the global quota is spent.
pub async fn rate_limit_middleware(
    State(limits): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if limits.global.check().is_err() {
        warn!(path = %request.uri().path(), "Global rate limit exceeded");
        return Err(ApiError::RateLimitExceeded);
    }
    Ok(next.run(request).await)
}

/// Rejects with 429 once the code-issue quota is spent. SMS and email
/// sends cost money, so these routes get their own budget.
pub async fn code_issue_limit_middleware(
    State(limits): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if limits.code_issue.check().is_err() {
        warn!(path = %request.uri().path(), "OTP send rate limit exceeded");
        return Err(ApiError::RateLimitExceeded);
    }
    Ok(next.run(request).await)
}

/// Logs method, path, status and latency of every request.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    if status.is_server_error() {
        warn!(%method, %path, %status, latency_ms, "Request failed");
    } else {
        debug!(%method, %path, %status, latency_ms, "Request completed");
    }

    response
}
