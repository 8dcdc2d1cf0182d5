use serde::Deserialize;
use serde_json::{Value, json};

use loomtrade_core::{DomainError, Money};
use loomtrade_infra::reconcile::{ActionOutcome, PaymentReceipt, WalletCredit, WalletView};
use loomtrade_invoicing::{ArtifactState, Invoice};
use loomtrade_payments::{Payment, PaymentMethod};
use loomtrade_sales::{Order, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

/// Rupees on the wire, as `"200.50"` or `200.5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RupeeAmount {
    Text(String),
    Number(serde_json::Number),
}

impl RupeeAmount {
    pub fn to_money(&self) -> Result<Money, DomainError> {
        match self {
            RupeeAmount::Text(s) => s.parse(),
            RupeeAmount::Number(n) => n.to_string().parse(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the catalog price when present.
    pub unit_price: Option<RupeeAmount>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: String,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: RupeeAmount,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn rupees(m: Money) -> String {
    m.to_string()
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id_typed().to_string(),
        "client_id": order.client_id().map(|id| id.to_string()),
        "company_id": order.company_id().map(|id| id.to_string()),
        "manager_id": order.manager_id().map(|id| id.to_string()),
        "created_by": order.creator(),
        "status": order.status(),
        "payment_status": order.payment_status(),
        "total_amount": rupees(order.total_amount()),
        "paid_amount": rupees(order.paid_amount()),
        "due_amount": rupees(order.due_amount()),
        "lines": order.lines().iter().map(|l| json!({
            "line_no": l.line_no,
            "product_id": l.product_id.0.to_string(),
            "quantity": l.quantity,
            "unit_price": rupees(l.unit_price),
            "line_total": rupees(l.line_total),
        })).collect::<Vec<_>>(),
        "payments": order.payment_refs().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "placed_at": order.placed_at(),
    })
}

pub fn payment_to_json(payment: &Payment) -> Value {
    json!({
        "id": payment.id.to_string(),
        "order_id": payment.order_id.to_string(),
        "client_id": payment.client_id.to_string(),
        "amount": rupees(payment.amount),
        "method": payment.method,
        "reference": payment.reference,
        "note": payment.note,
        "received_by": payment.received_by,
        "status": payment.state,
        "failure_reason": payment.failure_reason,
        "occurred_at": payment.occurred_at,
    })
}

pub fn invoice_to_json(invoice: &Invoice) -> Value {
    let artifact = match &invoice.artifact {
        ArtifactState::Generated { .. } => "generated",
        ArtifactState::NotGenerated => "not_generated",
    };
    json!({
        "id": invoice.id.to_string(),
        "number": invoice.number,
        "order_id": invoice.order_id.to_string(),
        "payment_id": invoice.payment_id.to_string(),
        "client": invoice.client,
        "company": invoice.company,
        "lines": invoice.lines.iter().map(|l| json!({
            "line_no": l.line_no,
            "product_id": l.product_id.0.to_string(),
            "description": l.description,
            "hsn": l.hsn,
            "ordered_quantity": l.ordered_quantity,
            "quantity": l.quantity,
            "unit_price": rupees(l.unit_price),
            "line_total": rupees(l.line_total),
        })).collect::<Vec<_>>(),
        "subtotal": rupees(invoice.subtotal),
        "tax_rate": invoice.tax_rate.to_string(),
        "tax_amount": rupees(invoice.tax_amount),
        "total_amount": rupees(invoice.total_amount),
        "status": invoice.status,
        "artifact": artifact,
        "last_render_error": invoice.last_render_error,
        "issued_at": invoice.issued_at,
    })
}

fn outcome_to_json<T>(outcome: &ActionOutcome<T>, result: impl Fn(&T) -> Value) -> Value {
    match outcome {
        ActionOutcome::Completed { result: r } => json!({"status": "completed", "result": result(r)}),
        ActionOutcome::Skipped { reason } => json!({"status": "skipped", "reason": reason}),
        ActionOutcome::Failed { error } => json!({"status": "failed", "error": error}),
    }
}

pub fn receipt_to_json(receipt: &PaymentReceipt) -> Value {
    json!({
        "payment": payment_to_json(&receipt.payment),
        "order": order_to_json(&receipt.order),
        "duplicate": receipt.duplicate,
        "invoice": outcome_to_json(&receipt.invoice, invoice_to_json),
        "wallet": outcome_to_json(&receipt.wallet, |c: &WalletCredit| json!({
            "manager_id": c.manager_id.to_string(),
            "coins": c.coins,
            "balance": c.balance,
        })),
    })
}

pub fn wallet_to_json(view: &WalletView) -> Value {
    json!({
        "manager_id": view.manager_id.to_string(),
        "balance": view.balance,
        "entries": view.entries.iter().map(|e| json!({
            "entry_id": e.entry_id.to_string(),
            "source_reference": e.source_reference,
            "amount": rupees(e.amount),
            "coins": e.coins,
            "occurred_at": e.occurred_at,
        })).collect::<Vec<_>>(),
    })
}
