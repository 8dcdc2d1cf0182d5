use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use loomtrade_core::{PaymentId, TenantId};
use loomtrade_invoicing::{Invoice, InvoiceId};
use loomtrade_sales::OrderId;

use super::StoreError;

/// Invoice storage with a per-tenant number sequence.
///
/// At most one invoice exists per payment; inserting a second one for the
/// same payment is rejected.
pub trait InvoiceStore: Send + Sync {
    /// Allocate the next number of the tenant's sequence, starting at 1.
    fn next_sequence(&self, tenant_id: TenantId) -> Result<u64, StoreError>;

    fn insert(&self, invoice: Invoice) -> Result<(), StoreError>;

    fn update(&self, invoice: &Invoice) -> Result<(), StoreError>;

    fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    fn for_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<Invoice>, StoreError>;

    /// Invoices of one order, oldest first.
    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Invoice>, StoreError>;
}

impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    fn next_sequence(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        (**self).next_sequence(tenant_id)
    }

    fn insert(&self, invoice: Invoice) -> Result<(), StoreError> {
        (**self).insert(invoice)
    }

    fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        (**self).update(invoice)
    }

    fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        (**self).get(tenant_id, id)
    }

    fn for_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<Invoice>, StoreError> {
        (**self).for_payment(tenant_id, payment_id)
    }

    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Invoice>, StoreError> {
        (**self).list_for_order(tenant_id, order_id)
    }
}

#[derive(Debug, Default)]
struct Books {
    by_id: HashMap<(TenantId, InvoiceId), Invoice>,
    by_payment: HashMap<(TenantId, PaymentId), InvoiceId>,
    sequences: HashMap<TenantId, u64>,
}

#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<Books>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn next_sequence(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        let mut books = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let seq = books.sequences.entry(tenant_id).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    fn insert(&self, invoice: Invoice) -> Result<(), StoreError> {
        let mut books = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let tenant = invoice.tenant_id;

        if books.by_payment.contains_key(&(tenant, invoice.payment_id)) {
            return Err(StoreError::Duplicate {
                entity: "invoice for payment",
                id: invoice.payment_id.to_string(),
            });
        }
        if books.by_id.contains_key(&(tenant, invoice.id)) {
            return Err(StoreError::Duplicate {
                entity: "invoice",
                id: invoice.id.to_string(),
            });
        }

        books
            .by_payment
            .insert((tenant, invoice.payment_id), invoice.id);
        books.by_id.insert((tenant, invoice.id), invoice);
        Ok(())
    }

    fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut books = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match books.by_id.get_mut(&(invoice.tenant_id, invoice.id)) {
            Some(slot) => {
                *slot = invoice.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "invoice",
                id: invoice.id.to_string(),
            }),
        }
    }

    fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let books = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(books.by_id.get(&(tenant_id, id)).cloned())
    }

    fn for_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<Invoice>, StoreError> {
        let books = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(books
            .by_payment
            .get(&(tenant_id, payment_id))
            .and_then(|id| books.by_id.get(&(tenant_id, *id)))
            .cloned())
    }

    fn list_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Invoice>, StoreError> {
        let books = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut invoices: Vec<Invoice> = books
            .by_id
            .iter()
            .filter(|((t, _), inv)| *t == tenant_id && inv.order_id == order_id)
            .map(|(_, inv)| inv.clone())
            .collect();
        invoices.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(invoices)
    }
}
