use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::net::TcpListener;
use tracing::info;

use finance::app;
use finance::config::AppConfig;
use finance::db;
use finance::external;
use finance::logging::{init_logging, LoggingConfig};
use finance::services::failure_cache::FailureCache;
use finance::session::SessionStore;
use finance::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env();
    config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;
    let provider_kind = config.provider_kind().map_err(|e| anyhow!(e))?;

    let pool = db::connect(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("failed to open ledger at {}", config.database_url))?;
    db::migrate(&pool).await.context("failed to run ledger migrations")?;

    let price_provider = external::provider_from_env(provider_kind)
        .with_context(|| format!("failed to create price provider {:?}", provider_kind))?;

    let sessions = SessionStore::new(&config.session_secret_bytes(), config.session_ttl());
    let failure_cache = FailureCache::new();
    spawn_sweeper(sessions.clone(), failure_cache.clone());

    let state = AppState {
        pool,
        price_provider,
        failure_cache,
        sessions,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("🚀 Finance running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Finance stopped");
    Ok(())
}

/// Periodically evicts expired sessions and lapsed lookup failures.
fn spawn_sweeper(sessions: SessionStore, failure_cache: FailureCache) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sessions.purge_expired();
            failure_cache.purge_expired();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
