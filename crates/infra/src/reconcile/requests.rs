use loomtrade_core::{ClientId, Money};
use loomtrade_payments::PaymentMethod;
use loomtrade_sales::{LineDraft, OrderId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub client_id: ClientId,
    pub lines: Vec<LineDraft>,
}

/// A payment taken by a manager or salesman.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// A payment proven by the gateway. `reference` is the gateway payment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub reference: String,
}
