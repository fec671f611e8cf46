//! # zkr-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the zkRune proof service. Storage
//! gateways are selected from the environment: REST blob storage and
//! Postgres when configured, in-memory development stores otherwise.

use std::sync::Arc;

use anyhow::Context;

use zkr_api::{AppConfig, AppState};
use zkr_proof::DeterministicBackend;
use zkr_storage::{
    BlobStore, HttpBlobStore, HttpBlobStoreConfig, MemoryBlobStore, MemoryRecordStore,
    PgRecordStore, RecordStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(?config, "configuration loaded");

    // Blob store: REST object storage when configured, in-memory otherwise.
    let blob: Arc<dyn BlobStore> = match (&config.storage_base_url, &config.storage_api_key) {
        (Some(base_url), Some(api_key)) => {
            let store = HttpBlobStore::new(HttpBlobStoreConfig::new(
                base_url,
                &config.storage_bucket,
                api_key,
            ))
            .map_err(|e| anyhow::anyhow!("blob store initialization failed: {e}"))?;
            tracing::info!(bucket = %config.storage_bucket, "blob store: REST object storage");
            Arc::new(store)
        }
        _ => {
            tracing::warn!(
                "STORAGE_BASE_URL / STORAGE_API_KEY not set — using in-memory blob store; \
                 ceremony artifacts will not survive restart"
            );
            Arc::new(MemoryBlobStore::new())
        }
    };

    // Record store: Postgres when configured, in-memory otherwise.
    let records: Arc<dyn RecordStore> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .context("record store connection failed")?;
            tracing::info!("record store: Postgres");
            Arc::new(PgRecordStore::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set — using in-memory record store; \
                 contribution metadata will not survive restart"
            );
            Arc::new(MemoryRecordStore::new())
        }
    };

    match &config.toolchain_circuits_dir {
        Some(dir) => tracing::info!(dir = %dir, "proof path: snarkjs toolchain"),
        None => tracing::warn!(
            "TOOLCHAIN_CIRCUITS_DIR not set — proof path uses the deterministic \
             development backend, which provides no zero-knowledge property"
        ),
    }

    let port = config.port;
    let state = AppState::with_gateways(
        blob,
        records,
        Arc::new(DeterministicBackend::new()),
        config,
    );
    let app = zkr_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("zkRune proof service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
