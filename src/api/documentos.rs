use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::api::common::{ok_response, request_id, ApiError, ApiPath, ApiResponse};
use crate::domains::documentos::{DocumentoNuevo, DocumentoSubido};
use crate::security::sanitize_filename;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(subir_documento))
        .route("/:id/descarga", get(descargar_documento))
}

/// Reads an uploaded document from a multipart form. The file goes in the
/// `archivo` (or `file`) field; `titulo`, `descripcion` and `creado_por` are
/// optional text fields.
pub async fn leer_documento_multipart(mut multipart: Multipart) -> Result<DocumentoNuevo, ApiError> {
    let mut nuevo = DocumentoNuevo::default();
    let mut recibido = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Error reading multipart field: {}", e);
                return Err(ApiError::bad_request("Formulario multipart inválido"));
            }
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "archivo" | "file" => {
                nuevo.nombre_archivo = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    error!("Error reading uploaded file: {}", e);
                    ApiError::bad_request("No se pudo leer el archivo recibido")
                })?;
                info!("Received file: {} ({} bytes)", nuevo.nombre_archivo, bytes.len());
                nuevo.contenido = bytes.to_vec();
                recibido = true;
            }
            "titulo" | "descripcion" | "creado_por" => {
                let texto = field.text().await.map_err(|e| {
                    error!("Error reading field {}: {}", field_name, e);
                    ApiError::bad_request("Formulario multipart inválido")
                })?;
                match field_name.as_str() {
                    "titulo" => nuevo.titulo = Some(texto),
                    "descripcion" => nuevo.descripcion = Some(texto),
                    _ => nuevo.creado_por = Some(texto),
                }
            }
            _ => {
                warn!("Unexpected field in multipart: {}", field_name);
            }
        }
    }

    if !recibido {
        return Err(ApiError::validation_error(
            "No se recibió ningún archivo. Use el campo 'archivo'.",
        ));
    }

    Ok(nuevo)
}

/// POST /api/documentos
pub async fn subir_documento(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentoSubido>>, ApiError> {
    let start_time = Instant::now();
    let nuevo = leer_documento_multipart(multipart).await?;
    let subido = state.documentos().crear_documento(None, nuevo).await?;
    Ok(ok_response(subido, request_id(&headers), start_time))
}

/// GET /api/documentos/:id/descarga
pub async fn descargar_documento(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let (documento, contenido) = state.documentos().descargar_documento(id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&documento.nombre_archivo)
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, documento.mime_type.as_str())
        .header(header::CONTENT_LENGTH, contenido.len())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(contenido))
        .map_err(|e| {
            error!("Failed to build download response: {}", e);
            ApiError::internal_server_error("No se pudo preparar la descarga")
        })
}
