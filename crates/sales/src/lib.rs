//! Orders domain module (event-sourced).
//!
//! Line-itemized orders and their financial lifecycle: totals fixed at
//! placement, payments applied against the due amount, status transitions.
//! Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod order;

pub use order::{
    ApplyPayment, CancelOrder, ChangeStatus, LineDraft, Order, OrderCancelled, OrderCommand,
    OrderEvent, OrderId, OrderLine, OrderPlaced, OrderStatus, PaymentApplication, PaymentApplied,
    PaymentStatus, PlaceOrder, StatusChanged, order_total, price_lines,
};
