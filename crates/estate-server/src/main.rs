mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use estate_api::storage::ImageStorage;
use estate_api::{AppState, AppStateInner};
use estate_db::Database;

use crate::config::Config;

/// Session pruning interval.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "estate=debug,estate_api=debug,estate_db=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {}", e);
            eprintln!("FATAL: {}.", e);
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database and storage
    let db = Database::open(&config.db_path)?;
    let storage = ImageStorage::new(config.storage_dir.clone()).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        storage,
        jwt_secret: config.jwt_secret.clone(),
        public_url: config.public_url.clone(),
        admin_session: chrono::Duration::hours(config.admin_session_hours),
        user_session: chrono::Duration::days(config.user_session_days),
        max_image_bytes: config.max_image_bytes,
        search_radius_km: config.search_radius_km,
    });

    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), CLEANUP_INTERVAL_SECS));

    let app = estate_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Estate server listening on {}", addr);
    info!(
        "Sessions: admin {}h, user {}d",
        config.admin_session_hours, config.user_session_days
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
