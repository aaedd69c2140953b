use anyhow::Result;
use clap::Parser;
use inventory_service::{
    api,
    config::Config,
    db,
    store::{InventoryStore, MemoryStore, PgStore},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    let store: Arc<dyn InventoryStore> = if config.in_memory {
        warn!("Running with the in-memory store, data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        info!("Connecting to postgres at {}:{}/{}", config.db_host, config.db_port, config.db_name);
        let pool = db::connect(&config).await?;

        info!("Running database migrations...");
        db::run_migrations(config.database_url()).await?;
        info!("Migrations completed successfully");

        Arc::new(PgStore::new(pool))
    };

    let app = api::create_router(api::AppState::new(store));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;

    info!("Inventory service web server started on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Inventory service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
