use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod domains;
pub mod security;
pub mod state;

use api::create_api_router;
use security::{get_cors_layer, request_id_middleware, security_headers_middleware};
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes();
    let cors = get_cors_layer(&app_state.config.app.cors_allowed_origins);

    Router::new()
        .merge(create_api_router())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit)) // 📦 uploads de documentos
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
