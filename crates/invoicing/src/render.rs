use core::fmt::Write as _;

use thiserror::Error;

use crate::invoice::InvoiceSnapshot;

/// Rendered document bytes plus what a download needs to serve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("invoice {0} has no lines to render")]
    EmptyInvoice(String),

    #[error("render failed: {0}")]
    Failed(String),
}

/// Document layout for invoices (PDF, text, ...).
pub trait InvoiceRenderer: Send + Sync {
    fn render(&self, snapshot: &InvoiceSnapshot) -> Result<RenderedArtifact, RenderError>;
}

impl<R> InvoiceRenderer for std::sync::Arc<R>
where
    R: InvoiceRenderer + ?Sized,
{
    fn render(&self, snapshot: &InvoiceSnapshot) -> Result<RenderedArtifact, RenderError> {
        (**self).render(snapshot)
    }
}

/// Fixed-width plain text layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl InvoiceRenderer for TextRenderer {
    fn render(&self, s: &InvoiceSnapshot) -> Result<RenderedArtifact, RenderError> {
        if s.lines.is_empty() {
            return Err(RenderError::EmptyInvoice(s.number.clone()));
        }

        let mut out = String::new();
        write_document(&mut out, s).map_err(|e| RenderError::Failed(e.to_string()))?;

        Ok(RenderedArtifact {
            file_name: format!("{}.txt", s.number),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: out.into_bytes(),
        })
    }
}

fn write_document(out: &mut String, s: &InvoiceSnapshot) -> core::fmt::Result {
    writeln!(out, "TAX INVOICE {}", s.number)?;
    writeln!(out, "Issued: {}", s.issued_at.format("%Y-%m-%d"))?;
    writeln!(out, "Order: {}  Payment: {}", s.order_id, s.payment_id)?;
    writeln!(out)?;

    writeln!(out, "From: {}", s.company.name)?;
    if let Some(addr) = &s.company.address {
        writeln!(out, "      {addr}")?;
    }
    if let Some(gstin) = &s.company.gstin {
        writeln!(out, "      GSTIN {gstin}")?;
    }
    writeln!(out, "To:   {}", s.client.name)?;
    if let Some(addr) = &s.client.address {
        writeln!(out, "      {addr}")?;
    }
    if let Some(gstin) = &s.client.gstin {
        writeln!(out, "      GSTIN {gstin}")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{:>3}  {:<28} {:>8} {:>6} {:>12} {:>12}",
        "#", "Item", "HSN", "Qty", "Rate", "Amount"
    )?;
    for line in &s.lines {
        writeln!(
            out,
            "{:>3}  {:<28} {:>8} {:>6} {:>12} {:>12}",
            line.line_no,
            line.description,
            line.hsn.as_deref().unwrap_or("-"),
            line.quantity,
            line.unit_price.to_string(),
            line.line_total.to_string(),
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{:>60} {:>12}", "Subtotal", s.subtotal.to_string())?;
    writeln!(
        out,
        "{:>60} {:>12}",
        format!("Tax @ {}", s.tax_rate),
        s.tax_amount.to_string()
    )?;
    writeln!(out, "{:>60} {:>12}", "Total", s.total_amount.to_string())?;
    Ok(())
}
