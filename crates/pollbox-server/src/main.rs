use anyhow::Result;
use clap::Parser;
use pollbox_core::memory::MemoryStore;
use pollbox_core::sqlite::SqliteStore;
use pollbox_core::store::PollStore;
use pollbox_core::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use config::{Config, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollbox=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    let store = open_store(&config).await?;
    let state = AppState::new(store, config.polls.clone());

    let app = pollbox_api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        backend = ?config.store.backend,
        "pollbox listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn PollStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; polls are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            ensure_data_dir(&config.database.url);
            let db = pollbox_db::create_pool_with_acquire_timeout(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(config.database.acquire_timeout_secs),
            )
            .await?;
            pollbox_db::run_migrations(&db).await?;
            tracing::info!(url = %config.database.url, "database ready");
            Ok(Arc::new(SqliteStore::with_timeout(
                db,
                Duration::from_millis(config.store.operation_timeout_ms),
            )))
        }
    }
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_data_dir(database_url: &str) {
    if let Some(db_path) = database_url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Could not create directory '{}': {}", parent.display(), e);
                }
            }
        }
    }
}
