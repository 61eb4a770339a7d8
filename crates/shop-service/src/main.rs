//! Linepicplus shop service - HTTP API for the storefront and admin.
//!
//! This is the main entry point for the shop service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_service::{create_router, AppState, ServiceConfig, StoreBackend};
use shop_store::{CollectionStore, FileStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shop service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        store_backend = ?config.store_backend,
        upload_dir = %config.upload_dir.display(),
        environment = %config.environment,
        stripe_configured = %config.stripe_secret_key.is_some(),
        "Service configuration loaded"
    );

    // Initialize store
    let store: Arc<dyn CollectionStore> = match config.store_backend {
        StoreBackend::File => {
            tracing::info!(path = %config.data_dir, "Opening JSON file store");
            Arc::new(FileStore::open(&config.data_dir)?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store - data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(config.product_image_dir()).await?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
