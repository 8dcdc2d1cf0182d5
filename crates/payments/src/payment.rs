use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomtrade_auth::Actor;
use loomtrade_core::{
    ClientId, DomainError, DomainResult, ManagerId, Money, PaymentId, SalesmanId, TenantId,
};
use loomtrade_sales::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Upi,
    Card,
    Cheque,
    Gateway,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Gateway => "gateway",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" | "bank_transfer" => Ok(PaymentMethod::Bank),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            "cheque" => Ok(PaymentMethod::Cheque),
            "gateway" => Ok(PaymentMethod::Gateway),
            other => Err(DomainError::validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Who took the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ReceivedBy {
    Manager(ManagerId),
    Salesman(SalesmanId),
    Gateway,
}

impl From<Actor> for ReceivedBy {
    fn from(actor: Actor) -> Self {
        match actor {
            Actor::Manager(id) => ReceivedBy::Manager(id),
            Actor::Salesman(id) => ReceivedBy::Salesman(id),
        }
    }
}

/// Settlement state of a record.
///
/// Written `Pending` before the order is touched, then finalized to
/// `Confirmed` or `Failed`. `Refunded` only follows `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Confirmed,
    Failed,
    Refunded,
}

impl core::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            PaymentState::Pending => "pending",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        })
    }
}

/// Input for a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub received_by: ReceivedBy,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub received_by: ReceivedBy,
    pub state: PaymentState,
    pub failure_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Payment {
    /// Build a `Pending` record after checking the shape of the input.
    ///
    /// Gateway records must come from the gateway and carry a reference;
    /// manual records may not claim the gateway method.
    pub fn pending(input: NewPayment) -> DomainResult<Self> {
        if input.amount.is_zero() {
            return Err(DomainError::validation("payment amount must be > 0"));
        }

        let reference = input
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let from_gateway = input.received_by == ReceivedBy::Gateway;
        let gateway_method = input.method == PaymentMethod::Gateway;
        if from_gateway != gateway_method {
            return Err(DomainError::validation(
                "gateway method is reserved for gateway-verified payments",
            ));
        }
        if from_gateway && reference.is_none() {
            return Err(DomainError::validation(
                "gateway payments require a gateway reference",
            ));
        }

        Ok(Self {
            id: PaymentId::new(),
            tenant_id: input.tenant_id,
            order_id: input.order_id,
            client_id: input.client_id,
            amount: input.amount,
            method: input.method,
            reference,
            note: input.note.filter(|n| !n.trim().is_empty()),
            received_by: input.received_by,
            state: PaymentState::Pending,
            failure_reason: None,
            occurred_at: input.occurred_at,
        })
    }

    pub fn is_gateway(&self) -> bool {
        self.received_by == ReceivedBy::Gateway
    }

    /// Whether this record holds its gateway reference. A failed attempt
    /// never moved money and may be replaced by a retry.
    pub fn claims_reference(&self) -> bool {
        self.is_gateway() && self.state != PaymentState::Failed
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        self.transition(PaymentState::Confirmed)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.transition(PaymentState::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    pub fn refund(&mut self) -> DomainResult<()> {
        self.transition(PaymentState::Refunded)
    }

    fn transition(&mut self, to: PaymentState) -> DomainResult<()> {
        let allowed = matches!(
            (self.state, to),
            (PaymentState::Pending, PaymentState::Confirmed)
                | (PaymentState::Pending, PaymentState::Failed)
                | (PaymentState::Confirmed, PaymentState::Refunded)
        );
        if !allowed {
            return Err(DomainError::invalid_transition(self.state, to));
        }
        self.state = to;
        Ok(())
    }
}
