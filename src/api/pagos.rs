use axum::{
    extract::State,
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::api::common::{
    ok_response, request_id, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, Eliminado,
};
use crate::domains::pagos::{CambiosPago, FiltrosPagos, NuevoPago, PagoDetalle};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(listar_pagos).post(crear_pago))
        .route(
            "/:id",
            get(obtener_pago).put(actualizar_pago).delete(eliminar_pago),
        )
}

/// GET /api/pagos
pub async fn listar_pagos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiQuery(filtros): ApiQuery<FiltrosPagos>,
) -> Result<Json<ApiResponse<Vec<PagoDetalle>>>, ApiError> {
    let request_id = request_id(&headers);
    let start_time = Instant::now();

    debug!(request_id = %request_id, filtros = ?filtros, "🔎 Filtering pagos");
    let pagos = state.pagos().filtrar_pagos(&filtros).await?;

    Ok(ok_response(pagos, request_id, start_time))
}

/// POST /api/pagos
pub async fn crear_pago(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(nuevo): ApiJson<NuevoPago>,
) -> Result<Json<ApiResponse<PagoDetalle>>, ApiError> {
    let start_time = Instant::now();
    let pago = state.pagos().crear_pago(&nuevo).await?;
    Ok(ok_response(pago, request_id(&headers), start_time))
}

/// GET /api/pagos/:id
pub async fn obtener_pago(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<PagoDetalle>>, ApiError> {
    let start_time = Instant::now();
    let pago = state.pagos().obtener_pago_por_id(id).await?;
    Ok(ok_response(pago, request_id(&headers), start_time))
}

/// PUT /api/pagos/:id
pub async fn actualizar_pago(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiJson(cambios): ApiJson<CambiosPago>,
) -> Result<Json<ApiResponse<PagoDetalle>>, ApiError> {
    let start_time = Instant::now();
    let pago = state.pagos().actualizar_pago(id, &cambios).await?;
    Ok(ok_response(pago, request_id(&headers), start_time))
}

/// DELETE /api/pagos/:id
pub async fn eliminar_pago(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Eliminado>>, ApiError> {
    let start_time = Instant::now();
    state.pagos().eliminar_pago(id).await?;
    Ok(ok_response(
        Eliminado {
            id,
            mensaje: format!("Pago {} eliminado", id),
        },
        request_id(&headers),
        start_time,
    ))
}
