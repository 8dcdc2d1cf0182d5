use serde::Serialize;

use loomtrade_core::ManagerId;
use loomtrade_invoicing::Invoice;
use loomtrade_payments::Payment;
use loomtrade_sales::Order;
use loomtrade_wallet::WalletEntry;

/// What happened to one post-commit action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome<T> {
    Completed { result: T },
    Skipped { reason: String },
    Failed { error: String },
}

impl<T> ActionOutcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        ActionOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed { .. })
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            ActionOutcome::Completed { result } => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletCredit {
    pub manager_id: ManagerId,
    pub coins: u64,
    pub balance: u64,
}

/// Result of recording a payment.
///
/// `payment` and `order` reflect the committed state. A `duplicate` receipt
/// carries the record that already held the gateway reference and runs no
/// post-commit action.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub order: Order,
    pub duplicate: bool,
    pub invoice: ActionOutcome<Invoice>,
    pub wallet: ActionOutcome<WalletCredit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDownload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    pub manager_id: ManagerId,
    pub balance: u64,
    pub entries: Vec<WalletEntry>,
}
