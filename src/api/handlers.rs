//! REST API endpoint handlers

use crate::api::types::{ApiResponse, HealthResponse};
use crate::error::AppError;
use crate::services::{OptionRecord, OptionsService, PricingService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

// ============================================================================
// Options
// ============================================================================

/// Option chain with margin figures - GET /get_options/{ticker}
///
/// fetch -> (empty: 404) -> calculate -> sanitize -> `{"success": true, "data": [...]}`.
/// Fetch and calculation failures are reported as 500 with the failure text.
pub async fn get_options(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<Vec<OptionRecord>>>, AppError> {
    info!("Received options request for {}", ticker);

    let rows = OptionsService::fetch_options(state.provider.as_ref(), &ticker)
        .await
        .map_err(|e| {
            error!("Options fetch failed for {}: {}", ticker, e);
            e
        })?;

    if rows.is_empty() {
        warn!("No options data available for {}", ticker);
        return Err(AppError::NotFound(ticker));
    }

    let priced = PricingService::calculate(rows).map_err(|e| {
        error!("Margin calculation failed for {}: {}", ticker, e);
        e
    })?;

    let data: Vec<OptionRecord> = priced.into_iter().map(OptionRecord::from).collect();
    info!("Serving {} option rows for {}", data.len(), ticker);

    Ok(Json(ApiResponse::success_with_data(data)))
}
