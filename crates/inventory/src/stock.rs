use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use loomtrade_core::{AggregateId, DomainError, DomainResult, Money, TenantId};

/// Product (stock item) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// Catalog details used for pricing and invoice lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub hsn: Option<String>,
    pub unit_price: Money,
}

/// One order line's claim on stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Per-tenant product stock.
///
/// `reserve` is all-or-nothing: the requests are checked in order, the first
/// one that cannot be met fails the whole batch with `InsufficientStock`, and
/// no level changes. Implementations must make the check and the decrement a
/// single critical section.
pub trait StockLedger: Send + Sync {
    fn reserve(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()>;

    /// Return previously reserved quantities.
    fn release(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()>;

    fn unit_price(&self, tenant_id: TenantId, product_id: ProductId) -> Option<Money>;

    fn describe(&self, tenant_id: TenantId, product_id: ProductId) -> Option<ProductInfo>;
}

impl<L> StockLedger for Arc<L>
where
    L: StockLedger + ?Sized,
{
    fn reserve(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()> {
        (**self).reserve(tenant_id, requests)
    }

    fn release(&self, tenant_id: TenantId, requests: &[StockRequest]) -> DomainResult<()> {
        (**self).release(tenant_id, requests)
    }

    fn unit_price(&self, tenant_id: TenantId, product_id: ProductId) -> Option<Money> {
        (**self).unit_price(tenant_id, product_id)
    }

    fn describe(&self, tenant_id: TenantId, product_id: ProductId) -> Option<ProductInfo> {
        (**self).describe(tenant_id, product_id)
    }
}

/// Compute the stock levels a batch reservation would leave behind.
///
/// `available` reports the current level of a product (`None` if unknown).
/// Lines naming the same product draw from the same running balance. Returns
/// the new level per touched product, or the first line that cannot be met.
pub fn plan_reservation<F>(
    requests: &[StockRequest],
    available: F,
) -> DomainResult<HashMap<ProductId, i64>>
where
    F: Fn(ProductId) -> Option<i64>,
{
    let mut remaining: HashMap<ProductId, i64> = HashMap::new();

    for req in requests {
        if req.quantity <= 0 {
            return Err(DomainError::InvalidLineItem {
                line_no: req.line_no,
                reason: "quantity must be > 0".to_string(),
            });
        }

        let level = match remaining.get(&req.product_id) {
            Some(level) => *level,
            None => available(req.product_id)
                .ok_or_else(|| DomainError::not_found("product", req.product_id))?,
        };

        if level < req.quantity {
            return Err(DomainError::InsufficientStock {
                line_no: req.line_no,
                product_id: req.product_id.to_string(),
                requested: req.quantity,
                available: level,
            });
        }

        remaining.insert(req.product_id, level - req.quantity);
    }

    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn req(line_no: u32, product_id: ProductId, quantity: i64) -> StockRequest {
        StockRequest {
            line_no,
            product_id,
            quantity,
        }
    }

    #[test]
    fn plan_decrements_each_product() {
        let a = ProductId::new(AggregateId::new());
        let b = ProductId::new(AggregateId::new());
        let levels: HashMap<ProductId, i64> = [(a, 10), (b, 3)].into_iter().collect();

        let plan = plan_reservation(&[req(1, a, 4), req(2, b, 3)], |p| levels.get(&p).copied())
            .unwrap();

        assert_eq!(plan[&a], 6);
        assert_eq!(plan[&b], 0);
    }

    #[test]
    fn first_short_line_fails_the_batch() {
        let a = ProductId::new(AggregateId::new());
        let b = ProductId::new(AggregateId::new());
        let levels: HashMap<ProductId, i64> = [(a, 10), (b, 1)].into_iter().collect();

        let err = plan_reservation(&[req(1, a, 5), req(2, b, 2)], |p| levels.get(&p).copied())
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                line_no: 2,
                product_id: b.to_string(),
                requested: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn repeated_product_draws_from_running_balance() {
        let a = ProductId::new(AggregateId::new());
        let err = plan_reservation(&[req(1, a, 6), req(2, a, 6)], |_| Some(10)).unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock { line_no: 2, available: 4, .. }
        ));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let a = ProductId::new(AggregateId::new());
        let err = plan_reservation(&[req(1, a, 1)], |_| None).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "product", .. }));
    }

    #[test]
    fn non_positive_quantity_is_an_invalid_line() {
        let a = ProductId::new(AggregateId::new());
        let err = plan_reservation(&[req(3, a, 0)], |_| Some(10)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidLineItem { line_no: 3, .. }));
    }

    proptest! {
        #[test]
        fn successful_plan_never_goes_negative(
            stock in 0i64..1_000,
            qtys in proptest::collection::vec(1i64..200, 1..8),
        ) {
            let a = ProductId::new(AggregateId::new());
            let requests: Vec<StockRequest> = qtys
                .iter()
                .enumerate()
                .map(|(i, q)| req(i as u32 + 1, a, *q))
                .collect();

            let wanted: i64 = qtys.iter().sum();
            match plan_reservation(&requests, |_| Some(stock)) {
                Ok(plan) => {
                    prop_assert!(wanted <= stock);
                    prop_assert_eq!(plan[&a], stock - wanted);
                }
                Err(DomainError::InsufficientStock { .. }) => prop_assert!(wanted > stock),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }
}
