use anyhow::Context;

use loomtrade_api::seed::Seed;
use loomtrade_infra::{InMemoryBackend, ReconciliationConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    loomtrade_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let config = ReconciliationConfig::from_env();

    let backend = InMemoryBackend::new();
    if let Ok(path) = std::env::var("SEED_FILE") {
        Seed::from_file(&path)?.apply(&backend)?;
    }

    let app = loomtrade_api::app::build_app_with(jwt_secret, backend, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
