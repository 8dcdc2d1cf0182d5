use std::sync::Arc;

use loomtrade_infra::event_store::InMemoryEventStore;
use loomtrade_infra::{Coordinator, InMemoryBackend, ReconciliationConfig};

/// Shared state behind every protected handler.
pub struct AppServices {
    pub coordinator: Coordinator<Arc<InMemoryEventStore>>,
}

impl AppServices {
    pub fn new(backend: InMemoryBackend, config: ReconciliationConfig) -> Self {
        Self {
            coordinator: backend.coordinator(config),
        }
    }
}
