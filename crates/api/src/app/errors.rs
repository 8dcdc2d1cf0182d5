use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use loomtrade_core::DomainError;
use loomtrade_infra::ReconcileError;
use loomtrade_payments::GatewayError;

pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    match err {
        ReconcileError::Domain(e) => domain_error_to_response(e),
        ReconcileError::GatewaySignatureMismatch => json_error(
            StatusCode::UNAUTHORIZED,
            "signature_mismatch",
            "gateway signature mismatch",
        ),
        ReconcileError::Gateway(GatewayError::InvalidKey(msg)) => {
            tracing::error!("gateway key unusable: {msg}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "gateway_not_configured",
                "gateway payments are not configured",
            )
        }
        ReconcileError::Gateway(e) => json_error(StatusCode::BAD_GATEWAY, "gateway_error", e.to_string()),
        e @ ReconcileError::ArtifactMissing { .. } => {
            json_error(StatusCode::GONE, "artifact_missing", e.to_string())
        }
        e @ ReconcileError::Conflict { .. } => json_error(StatusCode::CONFLICT, "conflict", e.to_string()),
        e @ ReconcileError::Render { .. } => {
            tracing::warn!("{e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "render_failed", e.to_string())
        }
        ReconcileError::Storage(msg) => {
            tracing::error!("storage failure: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let (status, code) = match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
        DomainError::InvalidLineItem { .. } => (StatusCode::BAD_REQUEST, "invalid_line_item"),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        DomainError::InsufficientStock { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock")
        }
        DomainError::OverpaymentRejected { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "overpayment_rejected")
        }
        DomainError::OrderNotPayable { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "order_not_payable"),
        DomainError::InvalidTransition { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition")
        }
        DomainError::DegenerateOrder { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "degenerate_order"),
        DomainError::NoValidLineItems { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "no_valid_line_items")
        }
        DomainError::InvariantViolation(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation")
        }
    };
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}
