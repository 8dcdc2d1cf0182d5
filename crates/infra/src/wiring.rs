//! Fully in-memory backend: one handle per collaborator so callers can seed
//! stock, parties and gateway orders, plus the coordinator built on top.

use std::sync::Arc;

use loomtrade_invoicing::{InvoiceRenderer, TextRenderer};

use crate::adapters::{InMemoryDirectory, InMemoryGateway, InMemoryStockLedger};
use crate::config::ReconciliationConfig;
use crate::event_store::InMemoryEventStore;
use crate::reconcile::{Collaborators, Coordinator};
use crate::stores::{InMemoryArtifactStore, InMemoryInvoiceStore, InMemoryPaymentStore};

#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    pub events: Arc<InMemoryEventStore>,
    pub stock: Arc<InMemoryStockLedger>,
    pub directory: Arc<InMemoryDirectory>,
    pub gateway: Arc<InMemoryGateway>,
    pub payments: Arc<InMemoryPaymentStore>,
    pub invoices: Arc<InMemoryInvoiceStore>,
    pub artifacts: Arc<InMemoryArtifactStore>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self, renderer: Arc<dyn InvoiceRenderer>) -> Collaborators {
        Collaborators {
            stock: self.stock.clone(),
            directory: self.directory.clone(),
            gateway: self.gateway.clone(),
            renderer,
            payments: self.payments.clone(),
            invoices: self.invoices.clone(),
            artifacts: self.artifacts.clone(),
        }
    }

    /// Coordinator rendering plain-text invoices.
    pub fn coordinator(&self, config: ReconciliationConfig) -> Coordinator<Arc<InMemoryEventStore>> {
        self.coordinator_with_renderer(config, Arc::new(TextRenderer))
    }

    pub fn coordinator_with_renderer(
        &self,
        config: ReconciliationConfig,
        renderer: Arc<dyn InvoiceRenderer>,
    ) -> Coordinator<Arc<InMemoryEventStore>> {
        Coordinator::new(self.events.clone(), self.collaborators(renderer), config)
    }
}
