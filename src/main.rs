use std::sync::Arc;

use anyhow::Context;
use counsel_api::config::config;
use counsel_api::store::{DocumentStore, MemoryStore, PgStore};
use counsel_api::{app, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config().clone();
    telemetry::init(config.environment);
    tracing::info!("Starting Counsel API in {:?} mode", config.environment);

    let store: Arc<dyn DocumentStore> = match &config.database.url {
        Some(_) => {
            let store = PgStore::connect(&config.database).await.context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to prepare the documents table")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!("Document store: {}", store.name());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, store).context("invalid currency configuration")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Counsel API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
