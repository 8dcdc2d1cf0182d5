use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// What the browser checkout hands back after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayNotes {
    /// Our order id, attached when the gateway order was created.
    pub internal_order_id: Option<String>,
}

/// Gateway-side order as fetched from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount_paise: u64,
    pub currency: String,
    #[serde(default)]
    pub notes: GatewayNotes,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("checkout signature does not match")]
    SignatureMismatch,

    #[error("gateway key secret is not usable: {0}")]
    InvalidKey(String),

    #[error("gateway order {0} not found")]
    OrderNotFound(String),

    #[error("gateway order {0} carries no internal order id")]
    MissingInternalOrder(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the payment gateway.
pub trait PaymentGateway: Send + Sync {
    fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, GatewayError>;
}

/// Hex `HMAC-SHA256(secret, "{order_id}|{payment_id}")`.
pub fn checkout_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a checkout confirmation in constant time.
pub fn verify_checkout_signature(
    secret: &str,
    confirmation: &CheckoutConfirmation,
) -> Result<(), GatewayError> {
    let expected = checkout_signature(
        secret,
        &confirmation.gateway_order_id,
        &confirmation.gateway_payment_id,
    )?;

    let expected = expected.as_bytes();
    let given = confirmation.signature.trim().to_ascii_lowercase();
    let given = given.as_bytes();

    if expected.len() != given.len() || !bool::from(expected.ct_eq(given)) {
        tracing::warn!(
            gateway_order_id = %confirmation.gateway_order_id,
            gateway_payment_id = %confirmation.gateway_payment_id,
            "checkout signature verification failed"
        );
        return Err(GatewayError::SignatureMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_known_vector() {
        let sig = checkout_signature("secret", "order_1", "pay_1").unwrap();
        assert_eq!(
            sig,
            "52115a0d3400de9e86aade1f1b6eba9e8974604f4e267a9e9a16633a4c8dd2cb"
        );
        assert_ne!(sig, checkout_signature("secret", "order_1", "pay_2").unwrap());
    }

    #[test]
    fn valid_confirmation_verifies() {
        let signature = checkout_signature("k", "order_A", "pay_A").unwrap();
        let confirmation = CheckoutConfirmation {
            gateway_order_id: "order_A".into(),
            gateway_payment_id: "pay_A".into(),
            signature: signature.to_uppercase(),
        };
        assert_eq!(verify_checkout_signature("k", &confirmation), Ok(()));
    }

    #[test]
    fn tampered_confirmation_is_rejected() {
        let signature = checkout_signature("k", "order_A", "pay_A").unwrap();
        let confirmation = CheckoutConfirmation {
            gateway_order_id: "order_A".into(),
            gateway_payment_id: "pay_B".into(),
            signature,
        };
        assert_eq!(
            verify_checkout_signature("k", &confirmation),
            Err(GatewayError::SignatureMismatch)
        );

        let short = CheckoutConfirmation {
            signature: "abc".into(),
            ..confirmation
        };
        assert_eq!(
            verify_checkout_signature("k", &short),
            Err(GatewayError::SignatureMismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signature = checkout_signature("right", "o", "p").unwrap();
        let confirmation = CheckoutConfirmation {
            gateway_order_id: "o".into(),
            gateway_payment_id: "p".into(),
            signature,
        };
        assert!(verify_checkout_signature("wrong", &confirmation).is_err());
    }
}
