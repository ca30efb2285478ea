//! Core types for payment dispatch.

use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Supported payment gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayId {
    Phonepe,
    GooglePay,
    Paytm,
    AmazonPay,
    BhimUpi,
    Razorpay,
    Stripe,
    Paypal,
    Card,
    CashDelivery,
    CashStore,
    StoredBalanceCard,
}

/// How a gateway settles a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    /// Hands off to a UPI wallet app on the device.
    WalletApp,
    /// Charges through a remote processor SDK.
    RemoteProcessor,
    /// Paid in cash, settled offline.
    CashTender,
    /// Debits the customer's stored-value card.
    StoredBalance,
}

impl GatewayId {
    pub const ALL: [GatewayId; 12] = [
        GatewayId::Phonepe,
        GatewayId::GooglePay,
        GatewayId::Paytm,
        GatewayId::AmazonPay,
        GatewayId::BhimUpi,
        GatewayId::Razorpay,
        GatewayId::Stripe,
        GatewayId::Paypal,
        GatewayId::Card,
        GatewayId::CashDelivery,
        GatewayId::CashStore,
        GatewayId::StoredBalanceCard,
    ];

    pub fn kind(self) -> GatewayKind {
        match self {
            GatewayId::Phonepe
            | GatewayId::GooglePay
            | GatewayId::Paytm
            | GatewayId::AmazonPay
            | GatewayId::BhimUpi => GatewayKind::WalletApp,
            GatewayId::Razorpay | GatewayId::Stripe | GatewayId::Paypal | GatewayId::Card => {
                GatewayKind::RemoteProcessor
            }
            GatewayId::CashDelivery | GatewayId::CashStore => GatewayKind::CashTender,
            GatewayId::StoredBalanceCard => GatewayKind::StoredBalance,
        }
    }

    /// Android package of the wallet app, if this gateway uses one.
    pub fn app_package(self) -> Option<&'static str> {
        match self {
            GatewayId::Phonepe => Some("com.phonepe.app"),
            GatewayId::GooglePay => Some("com.google.android.apps.nbu.paisa.user"),
            GatewayId::Paytm => Some("net.one97.paytm"),
            GatewayId::AmazonPay => Some("in.amazon.mShop.android.shopping"),
            GatewayId::BhimUpi => Some("in.org.npci.upiapp"),
            _ => None,
        }
    }

    /// Scheme the wallet app registers for payment intents.
    pub fn deep_link_scheme(self) -> &'static str {
        match self {
            GatewayId::Phonepe => "phonepe://pay",
            GatewayId::GooglePay => "tez://upi/pay",
            GatewayId::Paytm => "paytmmp://pay",
            _ => "upi://pay",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GatewayId::Phonepe => "PhonePe",
            GatewayId::GooglePay => "Google Pay",
            GatewayId::Paytm => "Paytm",
            GatewayId::AmazonPay => "Amazon Pay",
            GatewayId::BhimUpi => "BHIM UPI",
            GatewayId::Razorpay => "Razorpay",
            GatewayId::Stripe => "Stripe",
            GatewayId::Paypal => "PayPal",
            GatewayId::Card => "Credit / Debit Card",
            GatewayId::CashDelivery => "Cash on Delivery",
            GatewayId::CashStore => "Pay at Store",
            GatewayId::StoredBalanceCard => "Cafe Card",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GatewayId::Phonepe => "PHONEPE",
            GatewayId::GooglePay => "GOOGLE_PAY",
            GatewayId::Paytm => "PAYTM",
            GatewayId::AmazonPay => "AMAZON_PAY",
            GatewayId::BhimUpi => "BHIM_UPI",
            GatewayId::Razorpay => "RAZORPAY",
            GatewayId::Stripe => "STRIPE",
            GatewayId::Paypal => "PAYPAL",
            GatewayId::Card => "CARD",
            GatewayId::CashDelivery => "CASH_DELIVERY",
            GatewayId::CashStore => "CASH_STORE",
            GatewayId::StoredBalanceCard => "STORED_BALANCE_CARD",
        }
    }
}

impl std::fmt::Display for GatewayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        GatewayId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PaymentError::UnknownGateway(wanted.to_string()))
    }
}

/// Gateway environment selected for merchant credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

/// Progress and outcome of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentResult {
    /// Payment is in flight.
    Loading,
    /// Payment completed.
    Success { order_id: String },
    /// Payment failed with a human-readable reason.
    Failed { reason: String },
    /// Customer backed out.
    Cancelled,
}

impl PaymentResult {
    pub fn success(order_id: impl Into<String>) -> Self {
        PaymentResult::Success {
            order_id: order_id.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        PaymentResult::Failed {
            reason: reason.into(),
        }
    }

    /// Whether this result ends the attempt.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentResult::Loading)
    }
}

/// A checkout request from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub gateway: GatewayId,
    /// Amount in minor units (paise): 19999 is 199.99.
    pub amount: u64,
    /// Caller-chosen order id; generated when absent.
    #[serde(default)]
    pub order_id: Option<String>,
    pub customer_id: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_mobile: Option<String>,
    /// Free-form values passed through to the gateway.
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl PaymentRequest {
    pub fn new(gateway: GatewayId, amount: u64, customer_id: impl Into<String>) -> Self {
        Self {
            gateway,
            amount,
            order_id: None,
            customer_id: customer_id.into(),
            customer_email: None,
            customer_mobile: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.customer_mobile = Some(mobile.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A request bound to its resolved order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub order_id: String,
    pub gateway: GatewayId,
    pub amount: u64,
    pub customer_id: String,
    pub customer_email: Option<String>,
    pub customer_mobile: Option<String>,
    pub extra: HashMap<String, String>,
}

impl PaymentAttempt {
    pub fn new(order_id: String, request: PaymentRequest) -> Self {
        Self {
            order_id,
            gateway: request.gateway,
            amount: request.amount,
            customer_id: request.customer_id,
            customer_email: request.customer_email,
            customer_mobile: request.customer_mobile,
            extra: request.extra,
        }
    }

    /// Transaction note shown in the wallet app.
    pub fn note(&self) -> String {
        self.extra
            .get("note")
            .cloned()
            .unwrap_or_else(|| format!("Order {}", self.order_id))
    }
}

/// Render minor units with two decimals.
pub fn format_amount(minor: u64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}
