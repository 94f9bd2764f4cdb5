#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use gestiones_ws::{create_app_router, db::run_migrations, state::AppState};
use serde_json::Value;
use shared::config::{AppConfig, Config, DatabaseConfig, StorageConfig};
use shared::DatabaseService;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub docs_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.docs_dir);
    }
}

pub fn test_config(docs_dir: &PathBuf) -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            busy_timeout_seconds: 5,
        },
        storage: StorageConfig {
            docs_dir: docs_dir.to_string_lossy().into_owned(),
        },
        app: AppConfig {
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            port: 0,
            max_upload_size_mb: 1,
            cors_allowed_origins: Vec::new(),
        },
    }
}

pub async fn spawn_app() -> TestApp {
    let docs_dir = std::env::temp_dir().join(format!("gestiones-docs-{}", uuid::Uuid::new_v4()));
    let database = DatabaseService::in_memory().await.expect("in-memory database");
    run_migrations(database.pool()).await.expect("migrations");

    let state = Arc::new(AppState::from_database(database, test_config(&docs_dir)));
    let router = create_app_router(state.clone());

    TestApp {
        router,
        state,
        docs_dir,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Sends a multipart form with a single `archivo` field plus text fields.
    pub async fn upload(
        &self,
        uri: &str,
        file_name: &str,
        content: &[u8],
        fields: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let boundary = "gestiones-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    boundary, name, value
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"archivo\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn crear_gestion(&self, poliza: &str, fecha: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/gestiones",
                serde_json::json!({
                    "fecha": fecha,
                    "poliza": poliza,
                    "tipo": "Normal",
                    "cliente": "Cliente de prueba",
                    "dominio": "ab 123 cd",
                    "totalfactura": 1500.0
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "crear gestion: {}", body);
        body["data"]["id"].as_i64().expect("gestion id")
    }

    pub async fn crear_pago(&self, gestion_id: i64, formapago: &str, importe: f64) -> Value {
        let (status, body) = self
            .post(
                "/api/pagos",
                serde_json::json!({
                    "gestion_id": gestion_id,
                    "fecha": "2024-03-10",
                    "pagador": "SOS",
                    "destinatario": "PRESTADOR",
                    "formapago": formapago,
                    "importe": importe
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "crear pago: {}", body);
        body["data"].clone()
    }
}
