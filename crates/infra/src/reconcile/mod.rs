//! Order / payment / invoice reconciliation.

pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod requests;

pub use coordinator::{Collaborators, Coordinator, ORDER_AGGREGATE, WALLET_AGGREGATE};
pub use error::ReconcileError;
pub use outcome::{ActionOutcome, InvoiceDownload, PaymentReceipt, WalletCredit, WalletView};
pub use requests::{GatewayPayment, ManualPayment, NewOrder};
