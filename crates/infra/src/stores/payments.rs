use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use loomtrade_core::{PaymentId, TenantId};
use loomtrade_payments::Payment;
use loomtrade_sales::OrderId;

use super::StoreError;

/// Outcome of inserting a payment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInsert {
    Inserted(Payment),
    /// A gateway record already holds this reference; nothing was written.
    Duplicate(Payment),
}

/// Payment ledger storage.
///
/// Gateway references are unique across the whole store. The check and the
/// insert must be one atomic step so that two confirmations of the same
/// gateway payment produce exactly one record. A `failed` gateway record
/// never moved money: `find_by_gateway_reference` skips it and the next
/// insert with its reference replaces it. Manual references (cheque
/// numbers, UTRs) carry no uniqueness rule.
pub trait PaymentStore: Send + Sync {
    fn insert(&self, payment: Payment) -> Result<PaymentInsert, StoreError>;

    /// Replace an existing record (status finalization).
    fn update(&self, payment: &Payment) -> Result<(), StoreError>;

    fn get(&self, tenant_id: TenantId, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError>;

    /// Records against one order, in insertion order.
    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, StoreError>;
}

impl<S> PaymentStore for Arc<S>
where
    S: PaymentStore + ?Sized,
{
    fn insert(&self, payment: Payment) -> Result<PaymentInsert, StoreError> {
        (**self).insert(payment)
    }

    fn update(&self, payment: &Payment) -> Result<(), StoreError> {
        (**self).update(payment)
    }

    fn get(&self, tenant_id: TenantId, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        (**self).get(tenant_id, id)
    }

    fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        (**self).find_by_gateway_reference(reference)
    }

    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, StoreError> {
        (**self).list_for_order(tenant_id, order_id)
    }
}

#[derive(Debug, Default)]
struct Ledger {
    by_id: HashMap<PaymentId, Payment>,
    insertion: Vec<PaymentId>,
    gateway_refs: HashMap<String, PaymentId>,
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    inner: RwLock<Ledger>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn insert(&self, payment: Payment) -> Result<PaymentInsert, StoreError> {
        let mut ledger = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if ledger.by_id.contains_key(&payment.id) {
            return Err(StoreError::Duplicate {
                entity: "payment",
                id: payment.id.to_string(),
            });
        }

        let gateway_ref = payment
            .is_gateway()
            .then(|| payment.reference.clone())
            .flatten();

        if let Some(reference) = &gateway_ref {
            let holder = ledger
                .gateway_refs
                .get(reference)
                .and_then(|id| ledger.by_id.get(id))
                .cloned();
            match holder {
                Some(existing) if existing.claims_reference() => {
                    return Ok(PaymentInsert::Duplicate(existing));
                }
                // A failed attempt is superseded by the new record.
                Some(failed) => {
                    ledger.by_id.remove(&failed.id);
                    ledger.insertion.retain(|id| *id != failed.id);
                }
                None => {}
            }
        }

        if let Some(reference) = gateway_ref {
            ledger.gateway_refs.insert(reference, payment.id);
        }
        ledger.insertion.push(payment.id);
        ledger.by_id.insert(payment.id, payment.clone());
        Ok(PaymentInsert::Inserted(payment))
    }

    fn update(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut ledger = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match ledger.by_id.get_mut(&payment.id) {
            Some(slot) if slot.tenant_id == payment.tenant_id => {
                *slot = payment.clone();
                Ok(())
            }
            _ => Err(StoreError::Missing {
                entity: "payment",
                id: payment.id.to_string(),
            }),
        }
    }

    fn get(&self, tenant_id: TenantId, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let ledger = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(ledger
            .by_id
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let ledger = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(ledger
            .gateway_refs
            .get(reference.trim())
            .and_then(|id| ledger.by_id.get(id))
            .filter(|p| p.claims_reference())
            .cloned())
    }

    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, StoreError> {
        let ledger = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(ledger
            .insertion
            .iter()
            .filter_map(|id| ledger.by_id.get(id))
            .filter(|p| p.tenant_id == tenant_id && p.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loomtrade_core::{AggregateId, ClientId, ManagerId, Money};
    use loomtrade_payments::{NewPayment, PaymentMethod, PaymentState, ReceivedBy};

    fn payment(tenant_id: TenantId, order_id: OrderId, gateway_ref: Option<&str>) -> Payment {
        let (method, received_by) = match gateway_ref {
            Some(_) => (PaymentMethod::Gateway, ReceivedBy::Gateway),
            None => (PaymentMethod::Cheque, ReceivedBy::Manager(ManagerId::new())),
        };
        Payment::pending(NewPayment {
            tenant_id,
            order_id,
            client_id: ClientId::new(),
            amount: Money::from_paise(1_000),
            method,
            reference: Some(gateway_ref.unwrap_or("CHQ-1").to_string()),
            note: None,
            received_by,
            occurred_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn gateway_reference_is_claimed_once() {
        let store = InMemoryPaymentStore::new();
        let (t, o) = (TenantId::new(), OrderId::new(AggregateId::new()));

        let first = payment(t, o, Some("pay_1"));
        assert!(matches!(
            store.insert(first.clone()).unwrap(),
            PaymentInsert::Inserted(_)
        ));

        match store.insert(payment(t, o, Some("pay_1"))).unwrap() {
            PaymentInsert::Duplicate(existing) => assert_eq!(existing.id, first.id),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(store.list_for_order(t, o).unwrap().len(), 1);
        assert_eq!(
            store.find_by_gateway_reference("pay_1").unwrap().map(|p| p.id),
            Some(first.id)
        );
    }

    #[test]
    fn failed_record_is_replaced_by_a_retry() {
        let store = InMemoryPaymentStore::new();
        let (t, o) = (TenantId::new(), OrderId::new(AggregateId::new()));

        let mut first = payment(t, o, Some("pay_2"));
        store.insert(first.clone()).unwrap();
        first.fail("storage outage").unwrap();
        store.update(&first).unwrap();
        assert_eq!(store.find_by_gateway_reference("pay_2").unwrap(), None);

        let retry = payment(t, o, Some("pay_2"));
        assert!(matches!(
            store.insert(retry.clone()).unwrap(),
            PaymentInsert::Inserted(_)
        ));
        assert_eq!(
            store.find_by_gateway_reference("pay_2").unwrap().map(|p| p.id),
            Some(retry.id)
        );
        assert!(matches!(
            store.insert(payment(t, o, Some("pay_2"))).unwrap(),
            PaymentInsert::Duplicate(_)
        ));
        assert_eq!(store.get(t, first.id).unwrap(), None);
        assert_eq!(
            store.list_for_order(t, o).unwrap().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![retry.id]
        );
    }

    #[test]
    fn manual_references_may_repeat() {
        let store = InMemoryPaymentStore::new();
        let (t, o) = (TenantId::new(), OrderId::new(AggregateId::new()));

        store.insert(payment(t, o, None)).unwrap();
        store.insert(payment(t, o, None)).unwrap();
        assert_eq!(store.list_for_order(t, o).unwrap().len(), 2);
    }

    #[test]
    fn updates_replace_and_reads_are_tenant_scoped() {
        let store = InMemoryPaymentStore::new();
        let (t, o) = (TenantId::new(), OrderId::new(AggregateId::new()));
        let mut p = payment(t, o, None);
        store.insert(p.clone()).unwrap();

        p.confirm().unwrap();
        store.update(&p).unwrap();

        assert_eq!(
            store.get(t, p.id).unwrap().map(|p| p.state),
            Some(PaymentState::Confirmed)
        );
        assert_eq!(store.get(TenantId::new(), p.id).unwrap(), None);
        assert!(store.list_for_order(TenantId::new(), o).unwrap().is_empty());
    }

    #[test]
    fn updating_unknown_record_fails() {
        let store = InMemoryPaymentStore::new();
        let p = payment(TenantId::new(), OrderId::new(AggregateId::new()), None);
        assert!(matches!(store.update(&p), Err(StoreError::Missing { .. })));
    }
}
