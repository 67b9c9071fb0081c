//! Options Margin API
//!
//! Serves the nearest-expiration option chain for a ticker together with the
//! margin a seller would post, the premium collected and the return on margin.

pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod services;
pub mod state;

use anyhow::Context;
use api::ApiServer;
use config::ServerConfig;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "options_margin_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize and run the API server until Ctrl-C
pub fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Options Margin API...");

    let config = ServerConfig::from_env().context("loading configuration")?;
    let state = AppState::from_config(&config).context("initializing market data provider")?;

    tracing::info!(
        "Using Yahoo Finance at {}, static files from {}",
        config.yahoo.base_url,
        config.static_dir
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        ApiServer::new(config, state)
            .serve(shutdown_signal())
            .await
            .context("running API server")
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("API server shutting down");
}
