//! HTTP server for the REST API and the static front-end
//!
//! Routes:
//! - `GET /get_options/{ticker}` - option chain with margin figures
//! - `GET /health` - liveness
//! - `GET /` - `<static_dir>/index.html`
//! - `GET /static/*` - files under `<static_dir>`

use crate::api::handlers;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{http::HeaderValue, routing::get, Router};
use std::future::Future;
use std::path::Path;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new server
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes and middleware
    pub fn router(&self) -> Result<Router> {
        let static_dir = Path::new(&self.config.static_dir);
        let cors = Self::cors_layer(&self.config.allowed_origins)?;

        let app = Router::new()
            // Health check
            .route("/health", get(handlers::health_check))
            // Options API
            .route("/get_options/:ticker", get(handlers::get_options))
            // Front-end
            .route_service("/", ServeFile::new(static_dir.join("index.html")))
            .nest_service("/static", ServeDir::new(static_dir))
            .with_state(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        Ok(app)
    }

    /// CORS restricted to the configured origins, with credentials.
    ///
    /// Credentials rule out wildcard methods/headers, so requested ones are mirrored.
    fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
        let origins = origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| AppError::Config(format!("Invalid CORS origin '{}': {}", o, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()))
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address();
        let app = self.router()?;

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            error!("Failed to bind to {}: {}", addr, e);
            e
        })?;

        info!("Options Margin API server listening on {}", addr);
        info!("  Options: GET  http://{}/get_options/{{ticker}}", addr);
        info!("  Health:  GET  http://{}/health", addr);
        info!("  UI:      GET  http://{}/", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}
