//! In-memory collaborators for development and tests: stock ledger,
//! party directory and payment gateway.

pub mod directory;
pub mod gateway;
pub mod stock;

pub use directory::InMemoryDirectory;
pub use gateway::InMemoryGateway;
pub use stock::InMemoryStockLedger;
