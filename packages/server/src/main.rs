use std::str::FromStr;
use std::sync::Arc;

use dedup_common::storage::filesystem::FilesystemBlobStore;
use dedup_server::config::AppConfig;
use dedup_server::database::{ensure_indexes, init_db};
use dedup_server::state::AppState;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let level = Level::from_str(&config.log.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database.url, config.database.sqlx_logging).await?;
    ensure_indexes(&db).await?;
    info!("Database ready");

    let blob_store = FilesystemBlobStore::new(
        config.storage.blob_dir.clone(),
        config.storage.max_blob_size,
    )
    .await?;
    info!(path = %config.storage.blob_dir.display(), "Blob store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        config,
    };
    let app = dedup_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
