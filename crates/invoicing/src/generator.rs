use serde::{Deserialize, Serialize};

use loomtrade_core::{DomainError, Money, TaxRate, money::mul_div_ceil};
use loomtrade_inventory::{ProductId, ProductInfo};
use loomtrade_parties::PartySnapshot;
use loomtrade_payments::Payment;
use loomtrade_sales::Order;

use crate::invoice::InvoiceLine;

/// Invoice contents derived from one payment, before numbering and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub client: PartySnapshot,
    pub company: PartySnapshot,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total_amount: Money,
    /// Order lines left out because their product no longer resolves.
    pub skipped_lines: Vec<u32>,
}

/// Derive the invoice for `payment`'s share of `order`.
///
/// With `ratio = payment.amount / order.total`:
/// - quantity is `ceil(q * ratio)` clamped to `q`
/// - line total is `line_total * ratio` rounded half up to the paisa
/// - unit price is the order's, unscaled
///
/// The subtotal is the payment amount itself; tax is added on top. Scaled
/// line totals may differ from the subtotal by rounding remainders.
pub fn derive_invoice<C>(
    order: &Order,
    payment: &Payment,
    catalog: C,
    client: PartySnapshot,
    company: PartySnapshot,
    tax_rate: TaxRate,
) -> Result<InvoiceDraft, DomainError>
where
    C: Fn(ProductId) -> Option<ProductInfo>,
{
    let order_id = order.id_typed().to_string();
    let total = order.total_amount();
    if total.is_zero() {
        return Err(DomainError::DegenerateOrder { order_id });
    }

    let amount = payment.amount;
    let overflow = || DomainError::invariant("invoice amount overflows");

    let mut lines = Vec::with_capacity(order.lines().len());
    let mut skipped_lines = Vec::new();

    for line in order.lines() {
        let Some(info) = catalog(line.product_id) else {
            skipped_lines.push(line.line_no);
            continue;
        };

        let ordered = line.quantity.max(0) as u64;
        let ceil_qty = mul_div_ceil(ordered, amount.paise(), total.paise()).ok_or_else(overflow)?;
        let quantity = ceil_qty.min(ordered) as i64;
        let line_total = line.line_total.scale(amount, total).ok_or_else(overflow)?;

        lines.push(InvoiceLine {
            line_no: line.line_no,
            product_id: line.product_id,
            description: info.name,
            hsn: info.hsn,
            ordered_quantity: line.quantity,
            quantity,
            unit_price: line.unit_price,
            line_total,
        });
    }

    if lines.is_empty() {
        return Err(DomainError::NoValidLineItems { order_id });
    }

    let subtotal = amount;
    let tax_amount = tax_rate.tax_on(subtotal).ok_or_else(overflow)?;
    let total_amount = subtotal.checked_add(tax_amount).ok_or_else(overflow)?;

    Ok(InvoiceDraft {
        client,
        company,
        lines,
        subtotal,
        tax_rate,
        tax_amount,
        total_amount,
        skipped_lines,
    })
}
