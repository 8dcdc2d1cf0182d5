//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend wiring (event store, stores, coordinator)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use loomtrade_infra::{InMemoryBackend, ReconciliationConfig};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over a fresh in-memory backend.
pub fn build_app(jwt_secret: String, config: ReconciliationConfig) -> Router {
    build_app_with(jwt_secret, InMemoryBackend::new(), config)
}

/// Build the router over an existing backend, so callers can seed the
/// directory and stock ledger first.
pub fn build_app_with(
    jwt_secret: String,
    backend: InMemoryBackend,
    config: ReconciliationConfig,
) -> Router {
    let jwt = Arc::new(loomtrade_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(backend, config));

    // Protected routes: require auth + tenant context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
