use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use std::sync::Arc;
use std::time::Instant;

use crate::api::common::{ok_response, request_id, ApiError, ApiResponse};
use crate::state::AppState;

type ListaNombres = Result<Json<ApiResponse<Vec<String>>>, ApiError>;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/agentes", get(listar_agentes))
        .route("/formaspago", get(listar_formaspago))
        .route("/tipos", get(listar_tipos))
        .route("/estados", get(listar_estados))
}

/// GET /api/catalogos/agentes
pub async fn listar_agentes(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ListaNombres {
    let start_time = Instant::now();
    let agentes = state.catalogos().obtener_agentes().await?;
    Ok(ok_response(agentes, request_id(&headers), start_time))
}

/// GET /api/catalogos/formaspago
pub async fn listar_formaspago(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ListaNombres {
    let start_time = Instant::now();
    let formas = state.catalogos().obtener_formaspago().await?;
    Ok(ok_response(formas, request_id(&headers), start_time))
}

/// GET /api/catalogos/tipos
pub async fn listar_tipos(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ListaNombres {
    let start_time = Instant::now();
    let tipos = state.catalogos().obtener_tipos().await?;
    Ok(ok_response(tipos, request_id(&headers), start_time))
}

/// GET /api/catalogos/estados
pub async fn listar_estados(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ListaNombres {
    let start_time = Instant::now();
    let estados = state.catalogos().obtener_estados().await?;
    Ok(ok_response(estados, request_id(&headers), start_time))
}
