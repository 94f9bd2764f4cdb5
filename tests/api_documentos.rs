mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn subir_listar_y_descargar() {
    let app = common::spawn_app().await;
    let gestion = app.crear_gestion("POL-1", "2024-03-01").await;

    let (status, body) = app
        .upload(
            &format!("/api/gestiones/{}/documentos", gestion),
            "informe.pdf",
            b"%PDF-1.4 informe",
            &[("titulo", "Informe pericial"), ("creado_por", "operador")],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let subido = &body["data"];
    assert_eq!(subido["reutilizado"], false);
    assert_eq!(subido["vinculado"], true);
    assert_eq!(subido["documento"]["titulo"], "Informe pericial");
    assert_eq!(subido["documento"]["mime_type"], "application/pdf");
    assert_eq!(subido["documento"]["tamano_formato"], "16.0 B");
    let documento_id = subido["documento"]["id"].as_i64().unwrap();

    let hash = subido["documento"]["hash"].as_str().unwrap();
    assert!(app.docs_dir.join(format!("{}.pdf", hash)).exists());

    let (_, body) = app.get(&format!("/api/gestiones/{}/documentos", gestion)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/documentos/{}/descarga", documento_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"informe.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 informe");
}

#[tokio::test]
async fn el_mismo_contenido_se_reutiliza_entre_gestiones() {
    let app = common::spawn_app().await;
    let primera = app.crear_gestion("POL-1", "2024-03-01").await;
    let segunda = app.crear_gestion("POL-2", "2024-03-02").await;

    let (_, body) = app
        .upload(&format!("/api/gestiones/{}/documentos", primera), "foto.jpg", b"jpeg-bytes", &[])
        .await;
    let documento_id = body["data"]["documento"]["id"].clone();

    let (status, body) = app
        .upload(&format!("/api/gestiones/{}/documentos", segunda), "copia.jpg", b"jpeg-bytes", &[])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reutilizado"], true);
    assert_eq!(body["data"]["documento"]["id"], documento_id);

    let (_, body) = app
        .upload(&format!("/api/gestiones/{}/documentos", segunda), "copia.jpg", b"jpeg-bytes", &[])
        .await;
    assert_eq!(body["data"]["vinculado"], false);

    let archivos = std::fs::read_dir(&app.docs_dir).unwrap().count();
    assert_eq!(archivos, 1);
}

#[tokio::test]
async fn asociar_y_desasociar_documento() {
    let app = common::spawn_app().await;
    let gestion = app.crear_gestion("POL-1", "2024-03-01").await;

    let (status, body) = app
        .upload("/api/documentos", "planilla.xlsx", b"xlsx", &[])
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["vinculado"], false);
    let documento_id = body["data"]["documento"]["id"].as_i64().unwrap();

    let uri = format!("/api/gestiones/{}/documentos/{}", gestion, documento_id);
    let (status, body) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["datos"].as_array().unwrap().len(), 1);

    let (_, body) = app.post(&uri, json!({})).await;
    assert!(body["data"]["mensaje"].as_str().unwrap().contains("ya estaba"));

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // El archivo sigue disponible tras desasociarlo
    let (_, body) = app.get(&format!("/api/gestiones/{}/documentos", gestion)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(&app.docs_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn subida_sin_archivo_o_gestion_inexistente() {
    let app = common::spawn_app().await;

    let (status, _) = app
        .upload("/api/gestiones/999/documentos", "a.txt", b"a", &[])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.upload("/api/documentos", "vacio.txt", b"", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/documentos/999/descarga").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alta_masiva_vincula_documentos() {
    let app = common::spawn_app().await;

    let (_, body) = app.upload("/api/documentos", "lote.pdf", b"%PDF lote", &[]).await;
    let documento_id = body["data"]["documento"]["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            "/api/gestiones/masivas",
            json!({
                "gestiones": [
                    { "fecha": "2024-04-01", "poliza": "M-1", "tipo": "Normal" },
                    { "fecha": "2024-04-02", "poliza": "M-2", "tipo": "Normal" }
                ],
                "documento_ids": [documento_id]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["datos"]["documentos_asociados"], 2);

    for id in body["data"]["datos"]["creadas"].as_array().unwrap() {
        let (_, docs) = app.get(&format!("/api/gestiones/{}/documentos", id)).await;
        assert_eq!(docs["data"][0]["id"], documento_id);
    }

    let (status, _) = app
        .post(
            "/api/gestiones/masivas",
            json!({
                "gestiones": [{ "fecha": "2024-04-03", "poliza": "M-3", "tipo": "Normal" }],
                "documento_ids": [999]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
