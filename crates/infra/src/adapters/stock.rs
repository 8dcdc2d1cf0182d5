use std::collections::HashMap;
use std::sync::RwLock;

use loomtrade_core::{DomainError, DomainResult, Money, TenantId};
use loomtrade_inventory::{ProductId, ProductInfo, StockLedger, StockRequest, plan_reservation};

#[derive(Debug, Clone)]
struct StockItem {
    info: ProductInfo,
    on_hand: i64,
}

/// Stock levels behind one write lock; planning and applying a reservation
/// happen while it is held.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    items: RwLock<HashMap<(TenantId, ProductId), StockItem>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product (or replace its details and level).
    pub fn put_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        info: ProductInfo,
        on_hand: i64,
    ) -> DomainResult<()> {
        if on_hand < 0 {
            return Err(DomainError::validation(format!(
                "product {product_id}: stock level cannot be negative"
            )));
        }
        let mut items = self.write()?;
        items.insert((tenant_id, product_id), StockItem { info, on_hand });
        Ok(())
    }

    pub fn on_hand(&self, tenant_id: TenantId, product_id: ProductId) -> Option<i64> {
        let items = self.items.read().ok()?;
        items.get(&(tenant_id, product_id)).map(|i| i.on_hand)
    }

    /// Forget a product, as if it were deleted from the catalog.
    pub fn remove_product(&self, tenant_id: TenantId, product_id: ProductId) -> DomainResult<()> {
        self.write()?.remove(&(tenant_id, product_id));
        Ok(())
    }

    fn write(
        &self,
    ) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<(TenantId, ProductId), StockItem>>> {
        self.items
            .write()
            .map_err(|_| DomainError::invariant("stock ledger lock poisoned"))
    }
}

impl StockLedger for InMemoryStockLedger {
    fn reserve(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()> {
        let mut items = self.write()?;
        let levels = plan_reservation(requests, |product_id| {
            items.get(&(tenant_id, product_id)).map(|i| i.on_hand)
        })?;

        for (product_id, level) in levels {
            if let Some(item) = items.get_mut(&(tenant_id, product_id)) {
                item.on_hand = level;
            }
        }
        Ok(())
    }

    fn release(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()> {
        let mut items = self.write()?;
        for req in requests {
            match items.get_mut(&(tenant_id, req.product_id)) {
                Some(item) => item.on_hand = item.on_hand.saturating_add(req.quantity.max(0)),
                None => {
                    tracing::warn!(
                        product_id = %req.product_id,
                        quantity = req.quantity,
                        "released stock for a product no longer in the ledger"
                    );
                }
            }
        }
        Ok(())
    }

    fn unit_price(&self, tenant_id: TenantId, product_id: ProductId) -> Option<Money> {
        let items = self.items.read().ok()?;
        items.get(&(tenant_id, product_id)).map(|i| i.info.unit_price)
    }

    fn describe(&self, tenant_id: TenantId, product_id: ProductId) -> Option<ProductInfo> {
        let items = self.items.read().ok()?;
        items.get(&(tenant_id, product_id)).map(|i| i.info.clone())
    }
}
