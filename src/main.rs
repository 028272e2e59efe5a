use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bootcamp_api::config::AppConfig;
use bootcamp_api::database::open_store;
use bootcamp_api::services::LogMailer;
use bootcamp_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bootcamp_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting Bootcamp API in {:?} mode", config.environment);

    let store = open_store(&config.database).await.context("failed to open store")?;
    store.migrate().await.context("failed to run migrations")?;

    let port = config.server.port;
    let state = AppState::new(config, store, Arc::new(LogMailer)).context("invalid security configuration")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Bootcamp API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
