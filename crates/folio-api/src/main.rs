//! folio-api: HTTP server for the embedding sync pipeline.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::{ContentStore, VectorStoreClient};
use folio_db::{create_pool_with_config, MemoryContentStore, PgContentStore, PoolConfig};
use folio_inference::EmbedderConfig;
use folio_jobs::{SyncConfig, SyncController};
use folio_vector::{MemoryVectorIndex, UpstashConfig, UpstashVectorIndex};

use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, daily rotation)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - env filter (default: "folio_api=debug,folio_jobs=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_api=debug,folio_jobs=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("folio-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(folio_core::defaults::SERVER_PORT);

    let embedder = EmbedderConfig::from_env()?.build()?;
    let content = content_store().await?;
    let vectors = vector_index(embedder.clone())?;
    let config = SyncConfig::from_env();
    info!(
        item_delay_ms = config.item_delay_ms,
        incremental_window_hours = config.incremental_window_hours,
        job_retention = config.job_retention,
        "Sync configuration loaded"
    );

    let controller = SyncController::new(content, vectors, embedder, config);
    let app = routes::router(AppState {
        controller: Arc::new(controller),
    });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise an empty in-memory store.
async fn content_store() -> anyhow::Result<Arc<dyn ContentStore>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => {
            let pool = create_pool_with_config(&url, PoolConfig::from_env()).await?;
            info!(subsystem = "api", "Using PostgreSQL content store");
            Ok(Arc::new(PgContentStore::new(pool)))
        }
        _ => {
            warn!(
                subsystem = "api",
                "DATABASE_URL not set, using empty in-memory content store"
            );
            Ok(Arc::new(MemoryContentStore::new()))
        }
    }
}

/// Upstash when its URL and token are set, otherwise an in-memory index.
fn vector_index(
    embedder: Arc<dyn folio_core::EmbeddingGenerator>,
) -> anyhow::Result<Arc<dyn VectorStoreClient>> {
    match UpstashConfig::from_env() {
        Some(config) => {
            info!(subsystem = "api", "Using Upstash vector index");
            Ok(Arc::new(UpstashVectorIndex::new(config)?))
        }
        None => {
            warn!(
                subsystem = "api",
                "Upstash not configured, using in-memory vector index"
            );
            Ok(Arc::new(
                MemoryVectorIndex::new(embedder.dimension()).with_embedder(embedder),
            ))
        }
    }
}
