pub mod catalogos;
pub mod common;
pub mod documentos;
pub mod gestiones;
pub mod pagos;
pub mod periodos;
pub mod system;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Creates the API router with all REST endpoints
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(system::router())
        .nest("/api/catalogos", catalogos::router())
        .nest("/api/gestiones", gestiones::router())
        .nest("/api/pagos", pagos::router())
        .nest("/api/facturas", periodos::facturas_router())
        .nest("/api/notas", periodos::notas_router())
        .nest("/api/documentos", documentos::router())
}
