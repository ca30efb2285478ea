//! Payment error types.

use crate::types::{format_amount, GatewayId};
use thiserror::Error;

/// Errors that end a payment attempt as `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// No profile registered for the gateway.
    #[error("gateway not configured: {0}")]
    GatewayNotConfigured(GatewayId),

    /// Gateway name not recognised.
    #[error("Unknown gateway: {0}")]
    UnknownGateway(String),

    /// Stored-value card cannot cover the amount.
    #[error(
        "Insufficient balance: available {}, required {}",
        format_amount(*available),
        format_amount(*required)
    )]
    InsufficientBalance { available: u64, required: u64 },

    /// Request could not be turned into a gateway request.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Wallet app or store could not be opened.
    #[error("Failed to open payment app: {0}")]
    AppLaunch(String),

    /// Remote processor declined or failed.
    #[error("Payment processing failed: {0}")]
    Processor(String),

    /// Stored balance could not be fetched.
    #[error("Balance lookup failed: {0}")]
    BalanceLookup(String),
}
