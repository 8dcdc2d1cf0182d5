use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use loomtrade_core::{AggregateId, ClientId};
use loomtrade_infra::reconcile::{ManualPayment, NewOrder};
use loomtrade_inventory::ProductId;
use loomtrade_sales::{LineDraft, OrderId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", post(change_order_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/payments", post(record_payment).get(list_payments))
        .route("/:id/invoices", get(list_invoices))
}

fn parse_order_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse().map_err(|_| errors::invalid_id("order"))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let client_id: ClientId = match body.client_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("client"),
    };

    let mut lines = Vec::with_capacity(body.lines.len());
    for line in body.lines {
        let product: AggregateId = match line.product_id.parse() {
            Ok(v) => v,
            Err(_) => return errors::invalid_id("product"),
        };
        let unit_price = match line.unit_price.as_ref().map(dto::RupeeAmount::to_money) {
            None => None,
            Some(Ok(price)) => Some(price),
            Some(Err(e)) => return errors::domain_error_to_response(e),
        };
        lines.push(LineDraft {
            product_id: ProductId::new(product),
            quantity: line.quantity,
            unit_price,
        });
    }

    match services.coordinator.create_order(
        actor.actor(),
        tenant.tenant_id(),
        NewOrder { client_id, lines },
    ) {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services
        .coordinator
        .get_order(actor.actor(), tenant.tenant_id(), order_id)
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn change_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ChangeStatusRequest>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.coordinator.change_status(
        actor.actor(),
        tenant.tenant_id(),
        order_id,
        body.status,
    ) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

/// The body is optional; `{"reason": "..."}` is recorded on the order.
pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::CancelOrderRequest>>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let reason = body.and_then(|Json(b)| b.reason);
    match services
        .coordinator
        .cancel_order(actor.actor(), tenant.tenant_id(), order_id, reason)
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordPaymentRequest>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let amount = match body.amount.to_money() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.coordinator.record_payment(
        actor.actor(),
        tenant.tenant_id(),
        ManualPayment {
            order_id,
            amount,
            method: body.method,
            reference: body.reference,
            note: body.note,
        },
    ) {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services
        .coordinator
        .list_payments(actor.actor(), tenant.tenant_id(), order_id)
    {
        Ok(payments) => {
            let items = payments.iter().map(dto::payment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services
        .coordinator
        .invoices_for_order(actor.actor(), tenant.tenant_id(), order_id)
    {
        Ok(invoices) => {
            let items = invoices.iter().map(dto::invoice_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
