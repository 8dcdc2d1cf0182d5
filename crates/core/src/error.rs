//! Domain error model.

use thiserror::Error;

use crate::money::Money;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only. Every rule violation carries the ids
/// and amounts a caller needs to decide what to do next without re-querying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input shape or range.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Stale version / optimistic concurrency.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("line {line_no}: invalid line item: {reason}")]
    InvalidLineItem { line_no: u32, reason: String },

    #[error(
        "line {line_no}: insufficient stock for product {product_id} \
         (requested {requested}, available {available})"
    )]
    InsufficientStock {
        line_no: u32,
        product_id: String,
        requested: i64,
        available: i64,
    },

    #[error("payment of {amount} exceeds due amount {due} on order {order_id}")]
    OverpaymentRejected {
        order_id: String,
        amount: Money,
        due: Money,
    },

    #[error("order {order_id} is {status} and cannot accept payments")]
    OrderNotPayable { order_id: String, status: String },

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("order {order_id} has a zero total; no proportional invoice can be derived")]
    DegenerateOrder { order_id: String },

    #[error("no invoice line could be resolved for order {order_id}")]
    NoValidLineItems { order_id: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Rule violations detected before any mutation (4xx class, not retryable).
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidLineItem { .. }
                | Self::InsufficientStock { .. }
                | Self::OverpaymentRejected { .. }
                | Self::OrderNotPayable { .. }
                | Self::InvalidTransition { .. }
                | Self::DegenerateOrder { .. }
                | Self::NoValidLineItems { .. }
                | Self::InvariantViolation(_)
        )
    }
}
