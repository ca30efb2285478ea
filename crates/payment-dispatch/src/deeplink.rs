//! UPI deep links.

use crate::error::PaymentError;
use crate::profile::GatewayProfile;
use crate::types::{format_amount, PaymentAttempt};
use urlencoding::encode;

/// A UPI payment intent handed to a wallet app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpiLink {
    pub scheme: String,
    pub payee_vpa: String,
    pub payee_name: String,
    pub amount: u64,
    pub currency: String,
    pub transaction_ref: String,
    pub note: String,
}

impl UpiLink {
    /// Build the link for an attempt against a wallet profile.
    pub fn for_attempt(
        profile: &GatewayProfile,
        attempt: &PaymentAttempt,
    ) -> Result<Self, PaymentError> {
        let vpa = &profile.merchant.merchant_id;
        if !vpa.contains('@') {
            return Err(PaymentError::InvalidRequest(format!(
                "{} merchant id is not a UPI address",
                profile.display_name
            )));
        }

        Ok(Self {
            scheme: profile.param("scheme").unwrap_or("upi://pay").to_string(),
            payee_vpa: vpa.clone(),
            payee_name: profile.merchant.merchant_name.clone(),
            amount: attempt.amount,
            currency: profile.param("currency").unwrap_or("INR").to_string(),
            transaction_ref: attempt.order_id.clone(),
            note: attempt.note(),
        })
    }

    pub fn to_uri(&self) -> String {
        format!(
            "{}?pa={}&pn={}&am={}&cu={}&tr={}&tn={}",
            self.scheme,
            encode(&self.payee_vpa),
            encode(&self.payee_name),
            format_amount(self.amount),
            encode(&self.currency),
            encode(&self.transaction_ref),
            encode(&self.note)
        )
    }
}

impl std::fmt::Display for UpiLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GatewayId, PaymentRequest};

    fn attempt(amount: u64) -> PaymentAttempt {
        PaymentAttempt::new(
            "ORD123".to_string(),
            PaymentRequest::new(GatewayId::BhimUpi, amount, "cust-1"),
        )
    }

    #[test]
    fn test_uri_format() {
        let profile = GatewayProfile::new(GatewayId::BhimUpi, "cafe@upi")
            .with_merchant_name("Cafe Checkout")
            .with_param("currency", "INR");

        let link = UpiLink::for_attempt(&profile, &attempt(19_999)).unwrap();
        assert_eq!(
            link.to_uri(),
            "upi://pay?pa=cafe%40upi&pn=Cafe%20Checkout&am=199.99&cu=INR&tr=ORD123&tn=Order%20ORD123"
        );
    }

    #[test]
    fn test_wallet_scheme_used() {
        let profile = GatewayProfile::new(GatewayId::GooglePay, "cafe@okaxis");
        let link = UpiLink::for_attempt(&profile, &attempt(100)).unwrap();
        assert!(link.to_string().starts_with("tez://upi/pay?"));
        assert!(link.to_string().contains("am=1.00"));
    }

    #[test]
    fn test_rejects_non_vpa_merchant() {
        let profile = GatewayProfile::new(GatewayId::Phonepe, "merchant-42");
        assert!(matches!(
            UpiLink::for_attempt(&profile, &attempt(100)),
            Err(PaymentError::InvalidRequest(_))
        ));
    }
}
