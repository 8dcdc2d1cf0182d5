//! Stock ledger contract.
//!
//! Stock CRUD and spreadsheet import live outside this workspace. Order
//! placement only needs to reserve, release and price stock, so that is the
//! whole surface here. Reservation planning is pure and shared by every
//! ledger implementation.

pub mod stock;

pub use stock::{ProductId, ProductInfo, StockLedger, StockRequest, plan_reservation};
