mod config;
mod db;
mod error;
mod routes;
mod services;
mod shell;
mod state;
mod store;

use std::sync::Arc;

use config::AppConfig;
use services::currency::{CurrencyService, ExchangeRateClient};
use shell::{CacheStorage, DirAssetSource, OfflineShell};
use store::LocalStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let store = LocalStore::open(&config.database_url, config.db_max_connections)
        .await
        .expect("local store init failed");

    let rates = ExchangeRateClient::new(config.rates_url.clone(), config.rates_timeouts)
        .expect("exchange-rate client init failed");
    let currency = CurrencyService::new(Arc::new(rates));

    let shell = OfflineShell::new(
        config.cache_name.clone(),
        config.assets.clone(),
        Arc::new(DirAssetSource::new(config.asset_dir.clone())),
        CacheStorage::new(),
    );
    match shell.install().await {
        Ok(count) => tracing::info!(cache = shell.cache_name(), assets = count, "offline shell ready"),
        Err(e) => tracing::warn!(error = %e, "offline shell install failed; serving from asset dir"),
    }
    shell.activate().await;

    let state = state::AppState::new(store.clone(), currency, shell);
    let app = routes::app(state);

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "seven-utility listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    store.close().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
