//! Payment provider integration.
//!
//! Two concerns live here: creating provider orders over the Orders API and
//! verifying the signature the hosted checkout hands back to the client.
//! The signature is the trust boundary of the whole checkout flow: a
//! payment is accepted if and only if
//! `HMAC-SHA256(key_secret, "{order_id}|{payment_id}")` matches the
//! submitted value exactly.

use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::instrument;

use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Order created with the provider; `amount` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Client for the provider's REST API
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
            base_url,
        }
    }

    /// Public key id, handed to the hosted checkout widget.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a provider order for the given amount.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<ProviderOrder, ServiceError> {
        let amount_minor = to_minor_units(amount)?;
        let url = format!("{}/orders", self.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_minor,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("order creation: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ServiceError::ExternalServiceError(format!(
                "order creation returned {status}"
            )));
        }

        response
            .json::<ProviderOrder>()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("order parse: {e}")))
    }

    /// Check a checkout callback signature against the shared secret.
    pub fn verify_checkout_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        verify_signature(&self.key_secret, order_id, payment_id, signature)
    }
}

/// Convert a decimal major-unit amount to integral minor units (e.g. rupees
/// to paise). Rejects negative amounts and amounts too large for i64.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::InvalidOperation(
            "amount must be non-negative".to_string(),
        ));
    }
    (amount * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidOperation("amount out of range".to_string()))
}

/// Hex HMAC-SHA256 over `order_id|payment_id`.
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let payload = format!("{}|{}", order_id, payment_id);
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the expected and submitted signatures.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let expected = compute_signature(secret, order_id, payment_id);
    !expected.is_empty() && constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SECRET: &str = "test_provider_secret";

    #[test]
    fn valid_signature_verifies() {
        let sig = compute_signature(SECRET, "order_123", "pay_456");
        assert!(verify_signature(SECRET, "order_123", "pay_456", &sig));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let sig = compute_signature("another_secret", "order_123", "pay_456");
        assert!(!verify_signature(SECRET, "order_123", "pay_456", &sig));
    }

    #[test]
    fn swapped_ids_fail_verification() {
        let sig = compute_signature(SECRET, "order_123", "pay_456");
        assert!(!verify_signature(SECRET, "pay_456", "order_123", &sig));
    }

    #[test]
    fn truncated_signature_fails() {
        let sig = compute_signature(SECRET, "order_123", "pay_456");
        assert!(!verify_signature(
            SECRET,
            "order_123",
            "pay_456",
            &sig[..sig.len() - 2]
        ));
    }

    #[test]
    fn empty_signature_fails() {
        assert!(!verify_signature(SECRET, "order_123", "pay_456", ""));
    }

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor_units(dec!(299)).unwrap(), 29_900);
        assert_eq!(to_minor_units(dec!(224.1)).unwrap(), 22_410);
        assert_eq!(to_minor_units(dec!(0)).unwrap(), 0);
        assert_eq!(to_minor_units(dec!(10.005)).unwrap(), 1_001);
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(to_minor_units(dec!(-1)).is_err());
    }
}
