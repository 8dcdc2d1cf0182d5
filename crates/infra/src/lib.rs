//! Infrastructure layer: event store, command dispatch, record stores,
//! in-memory collaborators, configuration and the reconciliation
//! coordinator that composes them.

pub mod adapters;
pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod reconcile;
pub mod stores;
pub mod wiring;


pub use config::ReconciliationConfig;
pub use reconcile::{Coordinator, ReconcileError};
pub use wiring::InMemoryBackend;
