//! finapp service - HTTP API for the balance-transfer ledger
//!
//! This is the main entry point for the finapp service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finapp_service::{create_router, AppState, ServiceConfig};
use finapp_store::AnyStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,finapp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting finapp service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        backend = %config.backend,
        data_dir = %config.data_dir,
        database_configured = %config.database_url.is_some(),
        retry_max_attempts = config.retry_max_attempts,
        "Service configuration loaded"
    );

    let store = AnyStore::open(&config.store_config()?).await?;
    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
