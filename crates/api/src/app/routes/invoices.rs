use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use loomtrade_invoicing::InvoiceId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_invoice))
        .route("/:id/download", get(download_invoice))
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("invoice"),
    };
    match services
        .coordinator
        .get_invoice(actor.actor(), tenant.tenant_id(), invoice_id)
    {
        Ok(invoice) => (StatusCode::OK, Json(dto::invoice_to_json(&invoice))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

/// Rendered document as an attachment. Renders on demand when the earlier
/// attempt failed.
pub async fn download_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("invoice"),
    };
    let download = match services.coordinator.download_invoice_artifact(
        actor.actor(),
        tenant.tenant_id(),
        invoice_id,
    ) {
        Ok(d) => d,
        Err(e) => return errors::reconcile_error_to_response(e),
    };

    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        download.file_name
    ))
    .unwrap_or(HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response()
}
