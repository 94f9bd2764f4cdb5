use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::AppError;
use std::time::Instant;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domains::GestionesError;
use crate::security::{current_request_id, REQUEST_ID_HEADER};

/// JSON body whose parse errors answer with the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub request_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub execution_time_ms: Option<u64>,
    pub cached: bool,
}

/// Standard API error structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Payload with a human-readable message, for writes that report what they did.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConMensaje<T> {
    pub datos: T,
    pub mensaje: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Eliminado {
    pub id: i64,
    pub mensaje: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, request_id: String, execution_time_ms: Option<u64>, cached: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id,
            timestamp: chrono::Utc::now(),
            execution_time_ms,
            cached,
        }
    }

    pub fn error(error: ApiError, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            request_id,
            timestamp: chrono::Utc::now(),
            execution_time_ms: None,
            cached: false,
        }
    }
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation_error(message: &str) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn database_error(message: &str) -> Self {
        Self::new("DATABASE_ERROR", message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn file_error(message: &str) -> Self {
        Self::new("FILE_ERROR", message)
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new("INTERNAL_SERVER_ERROR", message)
    }

    pub fn status_code(&self) -> StatusCode {
        match self.code.as_str() {
            "VALIDATION_ERROR" | "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let response = ApiResponse::<()>::error(self, request_id);
        (status, Json(response)).into_response()
    }
}

impl From<GestionesError> for ApiError {
    fn from(err: GestionesError) -> Self {
        let message = err.to_string();
        match err {
            GestionesError::ValidacionLote(mensajes) => {
                ApiError::validation_error(&message).with_details(serde_json::json!(mensajes))
            }
            GestionesError::Validacion(_)
            | GestionesError::AgenteInexistente(_)
            | GestionesError::FormaPagoInexistente(_) => ApiError::validation_error(&message),
            GestionesError::Database(detalle) => {
                error!("❌ Database error: {}", detalle);
                ApiError::database_error("Error de base de datos")
            }
            GestionesError::Archivo(detalle) => {
                error!("❌ File error: {}", detalle);
                ApiError::file_error(&message)
            }
            ref e if e.es_no_encontrado() => ApiError::not_found(&message),
            ref e if e.es_conflicto() => {
                warn!("🚫 {}", message);
                ApiError::conflict(&message)
            }
            _ => ApiError::internal_server_error(&message),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        error!("❌ {}", err);
        let message = match err {
            AppError::Unavailable { .. } => "Base de datos no disponible",
            AppError::Database(_) => "Error de base de datos",
            AppError::Configuration { .. } => "Error interno del servidor",
        };
        Self::new(err.error_code(), message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("🚫 Invalid JSON body: {}", rejection.body_text());
        ApiError::validation_error(&format!("Cuerpo JSON inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("🚫 Invalid query string: {}", rejection.body_text());
        ApiError::validation_error(&format!("Parámetros inválidos: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(&format!("Ruta inválida: {}", rejection.body_text()))
    }
}

/// Request id set by the request-id middleware, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Wraps a handler result in the success envelope.
pub fn ok_response<T: Serialize>(
    data: T,
    request_id: String,
    start_time: Instant,
) -> Json<ApiResponse<T>> {
    let execution_time = start_time.elapsed().as_millis() as u64;
    Json(ApiResponse::success(data, request_id, Some(execution_time), false))
}
