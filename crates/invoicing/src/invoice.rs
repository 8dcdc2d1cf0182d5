use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomtrade_core::{
    AggregateId, ClientId, CompanyId, DomainError, Money, PaymentId, TaxRate, TenantId,
};
use loomtrade_inventory::ProductId;
use loomtrade_parties::PartySnapshot;
use loomtrade_sales::OrderId;

use crate::generator::InvoiceDraft;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for InvoiceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// `PREFIX-000042`.
pub fn format_invoice_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Invoice status lifecycle. Payment-backed invoices are born `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        })
    }
}

/// Whether a rendered document exists for the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactState {
    NotGenerated,
    Generated { locator: String },
}

/// Proportionally scaled order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub description: String,
    pub hsn: Option<String>,
    pub ordered_quantity: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub number: String,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub client_id: ClientId,
    pub company_id: CompanyId,
    pub client: PartySnapshot,
    pub company: PartySnapshot,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub status: InvoiceStatus,
    pub artifact: ArtifactState,
    pub last_render_error: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Everything a renderer needs, detached from storage concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub number: String,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub client: PartySnapshot,
    pub company: PartySnapshot,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    /// Issue a paid invoice from a derived draft. The artifact starts absent.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        id: InvoiceId,
        tenant_id: TenantId,
        number: String,
        order_id: OrderId,
        payment_id: PaymentId,
        client_id: ClientId,
        company_id: CompanyId,
        draft: InvoiceDraft,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            number,
            order_id,
            payment_id,
            client_id,
            company_id,
            client: draft.client,
            company: draft.company,
            lines: draft.lines,
            subtotal: draft.subtotal,
            tax_rate: draft.tax_rate,
            tax_amount: draft.tax_amount,
            total_amount: draft.total_amount,
            status: InvoiceStatus::Paid,
            artifact: ArtifactState::NotGenerated,
            last_render_error: None,
            issued_at,
        }
    }

    pub fn locator(&self) -> Option<&str> {
        match &self.artifact {
            ArtifactState::Generated { locator } => Some(locator),
            ArtifactState::NotGenerated => None,
        }
    }

    pub fn mark_rendered(&mut self, locator: impl Into<String>) {
        self.artifact = ArtifactState::Generated {
            locator: locator.into(),
        };
        self.last_render_error = None;
    }

    /// Leave the artifact absent and remember why.
    pub fn mark_render_failed(&mut self, error: impl Into<String>) {
        self.artifact = ArtifactState::NotGenerated;
        self.last_render_error = Some(error.into());
    }

    pub fn snapshot(&self) -> InvoiceSnapshot {
        InvoiceSnapshot {
            tenant_id: self.tenant_id,
            invoice_id: self.id,
            number: self.number.clone(),
            order_id: self.order_id,
            payment_id: self.payment_id,
            client: self.client.clone(),
            company: self.company.clone(),
            lines: self.lines.clone(),
            subtotal: self.subtotal,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            issued_at: self.issued_at,
        }
    }
}
