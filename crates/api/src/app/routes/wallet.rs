use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

/// Coin balance and credit history of the calling manager.
pub async fn get_wallet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services
        .coordinator
        .wallet_balance(actor.actor(), tenant.tenant_id())
    {
        Ok(view) => (StatusCode::OK, Json(dto::wallet_to_json(&view))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
