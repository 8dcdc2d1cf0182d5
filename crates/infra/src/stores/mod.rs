//! Tenant-isolated record stores for payments, invoices and rendered
//! artifacts. Orders and wallets live in the event store instead.

pub mod artifacts;
pub mod invoices;
pub mod payments;

use thiserror::Error;

pub use artifacts::{ArtifactStore, InMemoryArtifactStore, StoredArtifact};
pub use invoices::{InMemoryInvoiceStore, InvoiceStore};
pub use payments::{InMemoryPaymentStore, PaymentInsert, PaymentStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} already exists")]
    Duplicate { entity: &'static str, id: String },

    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: String },

    #[error("store lock poisoned")]
    Poisoned,
}
