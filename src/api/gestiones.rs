use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::api::common::{
    ok_response, request_id, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ConMensaje, Eliminado,
};
use crate::api::documentos::leer_documento_multipart;
use crate::domains::documentos::{DocumentoListado, DocumentoSubido};
use crate::domains::gestiones::{DatosGestion, FiltrosGestiones, Gestion, GestionesMasivas, ResultadoMasivo};
use crate::domains::pagos::PagoDetalle;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(listar_gestiones).post(crear_gestion))
        .route("/masivas", post(guardar_masivas))
        .route(
            "/:id",
            get(obtener_gestion).put(actualizar_gestion).delete(eliminar_gestion),
        )
        .route("/:id/pagos", get(listar_pagos_de_gestion))
        .route(
            "/:id/documentos",
            get(listar_documentos_de_gestion).post(subir_documento_a_gestion),
        )
        .route(
            "/:id/documentos/:documento_id",
            post(asociar_documento).delete(desasociar_documento),
        )
}

/// GET /api/gestiones
pub async fn listar_gestiones(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiQuery(filtros): ApiQuery<FiltrosGestiones>,
) -> Result<Json<ApiResponse<Vec<Gestion>>>, ApiError> {
    let request_id = request_id(&headers);
    let start_time = Instant::now();

    debug!(request_id = %request_id, filtros = ?filtros, "🔎 Filtering gestiones");
    let gestiones = state.gestiones().filter_gestiones(&filtros).await?;

    Ok(ok_response(gestiones, request_id, start_time))
}

/// POST /api/gestiones
pub async fn crear_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(datos): ApiJson<DatosGestion>,
) -> Result<Json<ApiResponse<Gestion>>, ApiError> {
    let start_time = Instant::now();
    let gestion = state.gestiones().crear_gestion(datos).await?;
    Ok(ok_response(gestion, request_id(&headers), start_time))
}

/// POST /api/gestiones/masivas
pub async fn guardar_masivas(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(lote): ApiJson<GestionesMasivas>,
) -> Result<Json<ApiResponse<ConMensaje<ResultadoMasivo>>>, ApiError> {
    let request_id = request_id(&headers);
    let start_time = Instant::now();

    let filas = lote.gestiones.len();
    let resultado = state.gestiones().guardar_gestiones_masivas(lote).await?;
    let mensaje = resultado.mensaje();

    info!(request_id = %request_id, filas, "📦 {}", mensaje);
    Ok(ok_response(
        ConMensaje {
            datos: resultado,
            mensaje,
        },
        request_id,
        start_time,
    ))
}

/// GET /api/gestiones/:id
pub async fn obtener_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Gestion>>, ApiError> {
    let start_time = Instant::now();
    let gestion = state.gestiones().obtener_gestion_por_id(id).await?;
    Ok(ok_response(gestion, request_id(&headers), start_time))
}

/// PUT /api/gestiones/:id
pub async fn actualizar_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiJson(datos): ApiJson<DatosGestion>,
) -> Result<Json<ApiResponse<Gestion>>, ApiError> {
    let start_time = Instant::now();
    let gestion = state.gestiones().actualizar_gestion(id, datos).await?;
    Ok(ok_response(gestion, request_id(&headers), start_time))
}

/// DELETE /api/gestiones/:id
pub async fn eliminar_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Eliminado>>, ApiError> {
    let start_time = Instant::now();
    state.gestiones().eliminar_gestion(id).await?;
    Ok(ok_response(
        Eliminado {
            id,
            mensaje: format!("Gestión {} eliminada", id),
        },
        request_id(&headers),
        start_time,
    ))
}

/// GET /api/gestiones/:id/pagos
pub async fn listar_pagos_de_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<PagoDetalle>>>, ApiError> {
    let start_time = Instant::now();
    state.gestiones().obtener_gestion_por_id(id).await?;
    let pagos = state.pagos().obtener_pagos_por_gestion(id).await?;
    Ok(ok_response(pagos, request_id(&headers), start_time))
}

/// GET /api/gestiones/:id/documentos
pub async fn listar_documentos_de_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<DocumentoListado>>>, ApiError> {
    let start_time = Instant::now();
    let documentos = state.documentos().obtener_documentos_por_gestion(id).await?;
    Ok(ok_response(documentos, request_id(&headers), start_time))
}

/// POST /api/gestiones/:id/documentos (multipart)
pub async fn subir_documento_a_gestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentoSubido>>, ApiError> {
    let start_time = Instant::now();
    let nuevo = leer_documento_multipart(multipart).await?;
    let subido = state.documentos().crear_documento(Some(id), nuevo).await?;
    Ok(ok_response(subido, request_id(&headers), start_time))
}

/// POST /api/gestiones/:id/documentos/:documento_id
pub async fn asociar_documento(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath((id, documento_id)): ApiPath<(i64, i64)>,
) -> Result<Json<ApiResponse<ConMensaje<Vec<DocumentoListado>>>>, ApiError> {
    let start_time = Instant::now();
    let documentos = state.documentos();

    let vinculado = documentos.asociar_documento(id, documento_id).await?;
    let mensaje = if vinculado {
        "Documento asociado a la gestión"
    } else {
        "El documento ya estaba asociado a esta gestión"
    };

    let listado = documentos.obtener_documentos_por_gestion(id).await?;
    Ok(ok_response(
        ConMensaje {
            datos: listado,
            mensaje: mensaje.to_string(),
        },
        request_id(&headers),
        start_time,
    ))
}

/// DELETE /api/gestiones/:id/documentos/:documento_id
pub async fn desasociar_documento(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath((id, documento_id)): ApiPath<(i64, i64)>,
) -> Result<Json<ApiResponse<Eliminado>>, ApiError> {
    let start_time = Instant::now();
    state.documentos().desasociar_documento(id, documento_id).await?;
    Ok(ok_response(
        Eliminado {
            id: documento_id,
            mensaje: "Documento desasociado de la gestión".to_string(),
        },
        request_id(&headers),
        start_time,
    ))
}
