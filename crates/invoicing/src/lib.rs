//! Invoicing domain module.
//!
//! One invoice per confirmed payment, covering the payment's proportional
//! share of its order. Derivation is a pure function of the order, the
//! payment, catalog data and the tax rate; rendering is a separate, failable
//! step whose outcome is recorded on the invoice.

pub mod generator;
pub mod invoice;
pub mod render;

pub use generator::{InvoiceDraft, derive_invoice};
pub use invoice::{
    ArtifactState, Invoice, InvoiceId, InvoiceLine, InvoiceSnapshot, InvoiceStatus,
    format_invoice_number,
};
pub use render::{InvoiceRenderer, RenderError, RenderedArtifact, TextRenderer};
