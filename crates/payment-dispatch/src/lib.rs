//! Unified payment dispatch for the checkout flow.
//!
//! One entry point, [`PaymentDispatcher::initiate_payment`], drives every
//! supported tender to a terminal [`PaymentResult`]:
//!
//! ```text
//! wallet app (PhonePe, GPay, ...) → installed? deep link : install / web / cancel
//! remote processor (card, Stripe) → RemoteProcessor::charge
//! cash, stored-balance card       → local check
//! ```
//!
//! Every attempt emits at most one `Loading` followed by exactly one of
//! `Success`, `Failed` or `Cancelled`.
//!
//! # Modules
//!
//! - [`config`] - Merchant settings, simulated latencies, processor keys
//! - [`profile`] - Gateway profiles and the start-up profile set
//! - [`registry`] - In-memory profile registry
//! - [`dispatcher`] - The dispatcher and its event handle
//! - [`platform`] - Device-side collaborators (app lookup, prompts, balances)
//! - [`deeplink`] - UPI deep links handed to wallet apps

pub mod config;
pub mod deeplink;
pub mod dispatcher;
pub mod error;
pub mod order;
pub mod platform;
pub mod profile;
pub mod registry;
pub mod types;

// Re-exports for convenience
pub use config::{DispatchConfig, ProcessorConfig};
pub use deeplink::UpiLink;
pub use dispatcher::{PaymentDispatcher, PaymentHandle};
pub use error::PaymentError;
pub use platform::{
    AppLocator, BalanceSource, FixedBalance, FixedChoice, InstallChoice, InstallPrompt,
    KnownApps, RemoteProcessor, SimulatedProcessor,
};
pub use profile::{default_profiles, GatewayProfile, MerchantCredentials};
pub use registry::GatewayRegistry;
pub use types::{
    format_amount, Environment, GatewayId, GatewayKind, PaymentAttempt, PaymentRequest,
    PaymentResult,
};
