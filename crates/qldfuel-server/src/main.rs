mod api;
mod middleware;

use std::sync::Arc;

use qldfuel_client::FuelPriceClient;
use qldfuel_core::AppConfig;
use qldfuel_engine::{Coordinator, HistoryStore, MemoryHistoryStore, SensorHub};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = qldfuel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting qldfuel-server");

    let client = FuelPriceClient::with_base_url(
        &config.subscriber_token,
        config.request_timeout_secs,
        &config.api_base_url,
    )?;
    let coordinator = Arc::new(Coordinator::new(client, config.home, config.settings.clone()));

    let store = history_store(&config).await?;
    let sensors = Arc::new(SensorHub::new(store, coordinator.shutdown_flag()));
    let sensor_task = tokio::spawn(Arc::clone(&sensors).run(coordinator.subscribe()));

    coordinator.start().await?;

    let app = build_app(AppState {
        coordinator: Arc::clone(&coordinator),
        sensors,
    });
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    coordinator.stop().await?;
    sensor_task.abort();
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise history kept in memory
/// for the life of the process.
async fn history_store(config: &AppConfig) -> anyhow::Result<Arc<dyn HistoryStore>> {
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL not set; price history is kept in memory only");
        return Ok(Arc::new(MemoryHistoryStore::new()));
    }

    let pool = qldfuel_db::connect_pool_from_config(config).await?;
    qldfuel_db::health_check(&pool).await?;
    tracing::info!("history store: connected to postgres");
    Ok(Arc::new(qldfuel_db::PgHistoryStore::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
