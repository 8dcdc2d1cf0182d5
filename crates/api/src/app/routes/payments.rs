use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use loomtrade_core::PaymentId;
use loomtrade_payments::CheckoutConfirmation;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/gateway/verify", post(verify_gateway_payment))
        .route("/:id", get(get_payment))
}

/// Checkout confirmation posted back after the customer pays.
///
/// A repeated confirmation answers 200 with `duplicate: true` instead of
/// recording twice.
pub async fn verify_gateway_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<CheckoutConfirmation>,
) -> axum::response::Response {
    match services
        .coordinator
        .verify_gateway_payment(tenant.tenant_id(), &body)
    {
        Ok(receipt) => {
            let status = if receipt.duplicate {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, Json(dto::receipt_to_json(&receipt))).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("payment"),
    };
    match services
        .coordinator
        .get_payment(actor.actor(), tenant.tenant_id(), payment_id)
    {
        Ok(payment) => (StatusCode::OK, Json(dto::payment_to_json(&payment))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
