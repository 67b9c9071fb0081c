//! REST API server module
//!
//! Provides:
//! - Option chain endpoint with margin/premium figures (`/get_options/{ticker}`)
//! - Static front-end (`/`, `/static/*`)
//! - Health check (`/health`)

mod server;
pub mod handlers;
mod types;

pub use server::ApiServer;
pub use types::{ApiResponse, HealthResponse};
