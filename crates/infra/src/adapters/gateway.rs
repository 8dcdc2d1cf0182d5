use std::collections::HashMap;
use std::sync::RwLock;

use loomtrade_payments::{GatewayError, GatewayOrder, PaymentGateway};

/// Gateway double holding orders registered up front.
///
/// `set_outage` makes every fetch fail with `Unavailable`, which is how a
/// network or auth failure against the real gateway surfaces.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    orders: RwLock<HashMap<String, GatewayOrder>>,
    outage: RwLock<Option<String>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_order(&self, order: GatewayOrder) {
        if let Ok(mut orders) = self.orders.write() {
            orders.insert(order.id.clone(), order);
        }
    }

    pub fn set_outage(&self, reason: Option<&str>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = reason.map(str::to_string);
        }
    }
}

impl PaymentGateway for InMemoryGateway {
    fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, GatewayError> {
        let outage = self
            .outage
            .read()
            .map_err(|_| GatewayError::Unavailable("gateway double lock poisoned".to_string()))?;
        if let Some(reason) = outage.as_ref() {
            return Err(GatewayError::Unavailable(reason.clone()));
        }

        let orders = self
            .orders
            .read()
            .map_err(|_| GatewayError::Unavailable("gateway double lock poisoned".to_string()))?;
        orders
            .get(gateway_order_id)
            .cloned()
            .ok_or_else(|| GatewayError::OrderNotFound(gateway_order_id.to_string()))
    }
}
