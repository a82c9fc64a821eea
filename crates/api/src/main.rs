use anyhow::Context;

use pantry_api::app::{build_app, AppServices};
use pantry_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    pantry_observability::init(config.log_format);

    let services = AppServices::from_backend(&config.store)?;

    // Serve the (stale, empty) cache even if the store is down at boot.
    match services.sync().refresh().await {
        Ok(snapshot) => tracing::info!(items = snapshot.items().len(), "initial inventory loaded"),
        Err(err) => tracing::warn!("initial inventory refresh failed: {err}"),
    }

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
