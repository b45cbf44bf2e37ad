use std::sync::Arc;
use std::time::Duration;

use cockpit_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, FilePreferenceStore},
    routes::{create_router, AppState},
    services::providers::{HttpAnswerService, PgCatalog},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cockpit_api=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let catalog = Arc::new(PgCatalog::new(pool, cache, config.catalog_cache_ttl));
    let preferences = FilePreferenceStore::new(&config.preferences_path);
    tracing::info!(path = ?preferences.path(), "Using preferences file");

    let answer_service = HttpAnswerService::new(
        config.answer_service_url.clone(),
        Duration::from_secs(config.answer_timeout_secs),
    )?;

    let state = Arc::new(AppState {
        preferences: Arc::new(preferences),
        catalog: catalog.clone(),
        testing_results: catalog,
        answer_service: Arc::new(answer_service),
    });

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
