use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::api::common::{ok_response, request_id, ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub database: String,
    pub database_response_time_ms: u64,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /health
pub async fn health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let request_id = request_id(&headers);
    let start_time = Instant::now();

    debug!(request_id = %request_id, "🏥 Health check");

    let db_start = Instant::now();
    state.database.health_check().await.map_err(ApiError::from)?;

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.app.environment.clone(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: "healthy".to_string(),
        database_response_time_ms: db_start.elapsed().as_millis() as u64,
    };

    Ok(ok_response(response, request_id, start_time))
}
