//! `loomtrade-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, money, the error taxonomy and the aggregate
//! contract used by the event-sourced order and wallet streams.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AggregateId, ClientId, CompanyId, ManagerId, PaymentId, SalesmanId, TenantId};
pub use money::{Money, TaxRate};
