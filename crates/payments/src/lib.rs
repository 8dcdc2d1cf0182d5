//! Payment records and gateway checkout verification.
//!
//! A [`Payment`] is an immutable ledger entry against one order; only its
//! settlement state moves. Gateway payments are proven by an HMAC signature
//! over the gateway's order and payment ids before anything is recorded.

pub mod gateway;
pub mod payment;

pub use gateway::{
    CheckoutConfirmation, GatewayError, GatewayNotes, GatewayOrder, PaymentGateway,
    checkout_signature, verify_checkout_signature,
};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentState, ReceivedBy};
