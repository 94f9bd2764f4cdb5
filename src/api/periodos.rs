use axum::{
    extract::State,
    http::HeaderMap,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::api::common::{
    ok_response, request_id, ApiError, ApiJson, ApiPath, ApiResponse, ConMensaje, Eliminado,
};
use crate::domains::periodos::{
    AsignacionNotas, DatosFactura, Factura, FacturaDetalle, FacturaResumen, NotaDetalle,
};
use crate::state::AppState;

/// Routes under /api/facturas
pub fn facturas_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(listar_facturas).post(crear_factura))
        .route(
            "/:id",
            get(obtener_factura).put(actualizar_factura).delete(eliminar_factura),
        )
        .route("/:id/notas", get(listar_notas_de_factura).post(asignar_notas))
}

/// Routes under /api/notas
pub fn notas_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sin-factura", get(listar_notas_sin_factura))
        .route("/:id/factura", delete(desasociar_nota))
}

/// GET /api/facturas
pub async fn listar_facturas(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<FacturaResumen>>>, ApiError> {
    let start_time = Instant::now();
    let facturas = state.periodos().obtener_facturas().await?;
    Ok(ok_response(facturas, request_id(&headers), start_time))
}

/// POST /api/facturas
///
/// With `nota_ids` the factura is created and the notes assigned in one go.
pub async fn crear_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(datos): ApiJson<DatosFactura>,
) -> Result<Json<ApiResponse<FacturaDetalle>>, ApiError> {
    let start_time = Instant::now();
    let periodos = state.periodos();

    let detalle = if datos.nota_ids.is_empty() {
        let factura = periodos.crear_factura(&datos).await?;
        FacturaDetalle {
            factura,
            notas: Vec::new(),
        }
    } else {
        periodos.crear_factura_con_notas(&datos).await?
    };

    Ok(ok_response(detalle, request_id(&headers), start_time))
}

/// GET /api/facturas/:id
pub async fn obtener_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<FacturaDetalle>>, ApiError> {
    let start_time = Instant::now();
    let detalle = state.periodos().obtener_detalle_factura(id).await?;
    Ok(ok_response(detalle, request_id(&headers), start_time))
}

/// PUT /api/facturas/:id
pub async fn actualizar_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiJson(datos): ApiJson<DatosFactura>,
) -> Result<Json<ApiResponse<Factura>>, ApiError> {
    let start_time = Instant::now();
    let factura = state.periodos().actualizar_factura(id, &datos).await?;
    Ok(ok_response(factura, request_id(&headers), start_time))
}

/// DELETE /api/facturas/:id
pub async fn eliminar_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Eliminado>>, ApiError> {
    let start_time = Instant::now();
    let liberadas = state.periodos().eliminar_factura(id).await?;
    Ok(ok_response(
        Eliminado {
            id,
            mensaje: format!("Factura {} eliminada; {} nota(s) liberadas", id, liberadas),
        },
        request_id(&headers),
        start_time,
    ))
}

/// GET /api/facturas/:id/notas
pub async fn listar_notas_de_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<NotaDetalle>>>, ApiError> {
    let start_time = Instant::now();
    let notas = state.periodos().obtener_notas_de_factura(id).await?;
    Ok(ok_response(notas, request_id(&headers), start_time))
}

/// POST /api/facturas/:id/notas
pub async fn asignar_notas(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiJson(asignacion): ApiJson<AsignacionNotas>,
) -> Result<Json<ApiResponse<ConMensaje<FacturaDetalle>>>, ApiError> {
    let request_id = request_id(&headers);
    let start_time = Instant::now();
    let periodos = state.periodos();

    let asignadas = periodos.asignar_notas_a_factura(&asignacion.nota_ids, id).await?;
    info!(request_id = %request_id, factura_id = id, asignadas, "🧾 Notas asignadas");

    let detalle = periodos.obtener_detalle_factura(id).await?;
    Ok(ok_response(
        ConMensaje {
            datos: detalle,
            mensaje: format!("{} nota(s) asignadas a la factura", asignadas),
        },
        request_id,
        start_time,
    ))
}

/// GET /api/notas/sin-factura
pub async fn listar_notas_sin_factura(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<NotaDetalle>>>, ApiError> {
    let start_time = Instant::now();
    let notas = state.periodos().obtener_notas_sin_factura().await?;
    Ok(ok_response(notas, request_id(&headers), start_time))
}

/// DELETE /api/notas/:id/factura
pub async fn desasociar_nota(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Eliminado>>, ApiError> {
    let start_time = Instant::now();
    state.periodos().desasociar_nota_de_factura(id).await?;
    Ok(ok_response(
        Eliminado {
            id,
            mensaje: format!("Nota {} desasociada de su factura", id),
        },
        request_id(&headers),
        start_time,
    ))
}
