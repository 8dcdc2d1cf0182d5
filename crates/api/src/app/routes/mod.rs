use axum::{Router, routing::get};

pub mod invoices;
pub mod orders;
pub mod payments;
pub mod system;
pub mod wallet;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/invoices", invoices::router())
        .route("/wallet", get(wallet::get_wallet))
}
