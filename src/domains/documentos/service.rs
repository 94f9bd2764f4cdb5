use sqlx::SqlitePool;
use tracing::{info, warn};

use super::models::{Documento, DocumentoListado, DocumentoNuevo, DocumentoSubido};
use super::storage::AlmacenDocumentos;
use crate::domains::error::{GestionesError, GestionesResult};

const COLUMNAS_DOCUMENTO: &str = "d.id, d.titulo, d.descripcion, d.nombre_archivo, d.mime_type, \
     d.tamano, d.hash, d.ruta, d.creado_por, d.creado_en";

/// Servicio de documentos: alta deduplicada por hash y vínculos con gestiones
pub struct DocumentoService {
    db: SqlitePool,
    almacen: AlmacenDocumentos,
}

impl DocumentoService {
    pub fn new(db: SqlitePool, almacen: AlmacenDocumentos) -> Self {
        Self { db, almacen }
    }

    /// Guarda el archivo y registra el documento. Si ya hay un documento con
    /// el mismo contenido se reutiliza. Con `gestion_id` además lo vincula.
    pub async fn crear_documento(
        &self,
        gestion_id: Option<i64>,
        nuevo: DocumentoNuevo,
    ) -> GestionesResult<DocumentoSubido> {
        let nombre_archivo = nuevo.nombre_archivo.trim().to_string();
        if nombre_archivo.is_empty() || nuevo.contenido.is_empty() {
            return Err(GestionesError::validacion("No se recibió ningún archivo"));
        }
        let titulo = nuevo
            .titulo
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&nombre_archivo)
            .to_string();
        let descripcion = nuevo
            .descripcion
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        if let Some(gestion_id) = gestion_id {
            self.verificar_gestion(gestion_id).await?;
        }

        let archivo = self.almacen.guardar(&nombre_archivo, &nuevo.contenido).await?;

        let mut tx = self.db.begin().await?;

        let existente: Option<i64> = sqlx::query_scalar("SELECT id FROM documentos WHERE hash = ?")
            .bind(&archivo.hash)
            .fetch_optional(&mut *tx)
            .await?;

        let (documento_id, reutilizado) = match existente {
            Some(id) => (id, true),
            None => {
                let id = sqlx::query(
                    "INSERT INTO documentos
                        (titulo, descripcion, nombre_archivo, mime_type, tamano, hash, ruta, creado_por)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&titulo)
                .bind(&descripcion)
                .bind(&nombre_archivo)
                .bind(&archivo.mime_type)
                .bind(archivo.tamano)
                .bind(&archivo.hash)
                .bind(&archivo.ruta)
                .bind(&nuevo.creado_por)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
                (id, false)
            }
        };

        let vinculado = match gestion_id {
            Some(gestion_id) => {
                sqlx::query(
                    "INSERT OR IGNORE INTO gestion_documento (gestion_id, documento_id) VALUES (?, ?)",
                )
                .bind(gestion_id)
                .bind(documento_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                    > 0
            }
            None => false,
        };

        tx.commit().await?;

        let mensaje = match (gestion_id.is_some(), reutilizado, vinculado) {
            (true, _, false) => "El documento ya estaba asociado a esta gestión",
            (true, true, true) => "Documento existente asociado a la gestión",
            (true, false, true) => "Documento guardado y asociado a la gestión",
            (false, true, _) => "El documento ya existía",
            (false, false, _) => "Documento guardado",
        }
        .to_string();

        info!(documento_id, hash = %archivo.hash, reutilizado, vinculado, "📄 {}", mensaje);

        let documento = self.obtener_documento(documento_id).await?;
        Ok(DocumentoSubido {
            documento: documento.into(),
            reutilizado,
            vinculado,
            mensaje,
        })
    }

    /// Vincula un documento existente. Devuelve `false` si ya estaba vinculado.
    pub async fn asociar_documento(&self, gestion_id: i64, documento_id: i64) -> GestionesResult<bool> {
        self.verificar_gestion(gestion_id).await?;
        self.obtener_documento(documento_id).await?;

        let resultado = sqlx::query(
            "INSERT OR IGNORE INTO gestion_documento (gestion_id, documento_id) VALUES (?, ?)",
        )
        .bind(gestion_id)
        .bind(documento_id)
        .execute(&self.db)
        .await?;

        Ok(resultado.rows_affected() > 0)
    }

    pub async fn obtener_documentos_por_gestion(&self, gestion_id: i64) -> GestionesResult<Vec<DocumentoListado>> {
        self.verificar_gestion(gestion_id).await?;

        let documentos = sqlx::query_as::<_, Documento>(&format!(
            "SELECT {} FROM documentos d
             JOIN gestion_documento gd ON gd.documento_id = d.id
             WHERE gd.gestion_id = ?
             ORDER BY d.creado_en DESC, d.id DESC",
            COLUMNAS_DOCUMENTO
        ))
        .bind(gestion_id)
        .fetch_all(&self.db)
        .await?;

        Ok(documentos.into_iter().map(DocumentoListado::from).collect())
    }

    pub async fn obtener_documento(&self, documento_id: i64) -> GestionesResult<Documento> {
        sqlx::query_as::<_, Documento>(&format!(
            "SELECT {} FROM documentos d WHERE d.id = ?",
            COLUMNAS_DOCUMENTO
        ))
        .bind(documento_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GestionesError::DocumentoNoEncontrado(documento_id))
    }

    /// Metadatos y contenido del archivo guardado.
    pub async fn descargar_documento(&self, documento_id: i64) -> GestionesResult<(Documento, Vec<u8>)> {
        let documento = self.obtener_documento(documento_id).await?;
        let contenido = self.almacen.leer(&documento.ruta).await.map_err(|e| {
            warn!(documento_id, ruta = %documento.ruta, error = %e, "Archivo de documento no disponible");
            GestionesError::Archivo(format!("El archivo del documento {} no está disponible", documento_id))
        })?;
        Ok((documento, contenido))
    }

    /// Quita el vínculo. El documento y su archivo se conservan.
    pub async fn desasociar_documento(&self, gestion_id: i64, documento_id: i64) -> GestionesResult<()> {
        let resultado = sqlx::query(
            "DELETE FROM gestion_documento WHERE gestion_id = ? AND documento_id = ?",
        )
        .bind(gestion_id)
        .bind(documento_id)
        .execute(&self.db)
        .await?;

        if resultado.rows_affected() == 0 {
            return Err(GestionesError::DocumentoNoEncontrado(documento_id));
        }

        info!(gestion_id, documento_id, "📎 Documento desasociado");
        Ok(())
    }

    async fn verificar_gestion(&self, gestion_id: i64) -> GestionesResult<()> {
        let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM gestiones WHERE id = ?")
            .bind(gestion_id)
            .fetch_optional(&self.db)
            .await?;
        existe
            .map(|_| ())
            .ok_or(GestionesError::GestionNoEncontrada(gestion_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use shared::DatabaseService;
    use std::path::PathBuf;

    async fn setup() -> (DocumentoService, PathBuf) {
        let db = DatabaseService::in_memory().await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        sqlx::query(
            "INSERT INTO gestiones (id, fecha, poliza, tipo) VALUES
             (1, '2024-01-01', 'P1', 'Normal'), (2, '2024-01-02', 'P2', 'Normal')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let dir = std::env::temp_dir().join(format!("docs-{}", uuid::Uuid::new_v4()));
        let svc = DocumentoService::new(db.pool().clone(), AlmacenDocumentos::new(&dir));
        (svc, dir)
    }

    fn archivo(nombre: &str, contenido: &[u8]) -> DocumentoNuevo {
        DocumentoNuevo {
            nombre_archivo: nombre.to_string(),
            contenido: contenido.to_vec(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mismo_contenido_reutiliza_el_documento() {
        let (svc, dir) = setup().await;

        let primero = svc
            .crear_documento(Some(1), archivo("factura.pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(!primero.reutilizado);
        assert!(primero.vinculado);
        assert_eq!(primero.documento.documento.titulo, "factura.pdf");
        assert_eq!(primero.documento.documento.mime_type, "application/pdf");
        assert_eq!(primero.documento.tamano_formato, "8.0 B");

        let segundo = svc
            .crear_documento(Some(2), archivo("copia.pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(segundo.reutilizado);
        assert_eq!(segundo.documento.documento.id, primero.documento.documento.id);

        let repetido = svc
            .crear_documento(Some(1), archivo("factura.pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(!repetido.vinculado);

        assert_eq!(svc.obtener_documentos_por_gestion(1).await.unwrap().len(), 1);
        assert_eq!(svc.obtener_documentos_por_gestion(2).await.unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn desasociar_conserva_el_archivo() {
        let (svc, dir) = setup().await;
        let subido = svc
            .crear_documento(Some(1), archivo("nota.txt", b"contenido"))
            .await
            .unwrap();
        let id = subido.documento.documento.id;

        svc.desasociar_documento(1, id).await.unwrap();
        assert!(svc.obtener_documentos_por_gestion(1).await.unwrap().is_empty());

        let (documento, contenido) = svc.descargar_documento(id).await.unwrap();
        assert_eq!(documento.nombre_archivo, "nota.txt");
        assert_eq!(contenido, b"contenido");

        assert!(matches!(
            svc.desasociar_documento(1, id).await.unwrap_err(),
            GestionesError::DocumentoNoEncontrado(_)
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn alta_sin_vinculo_y_asociacion_posterior() {
        let (svc, dir) = setup().await;
        let subido = svc
            .crear_documento(None, archivo("foto.png", b"\x89PNG"))
            .await
            .unwrap();
        assert!(!subido.vinculado);

        let id = subido.documento.documento.id;
        assert!(svc.asociar_documento(2, id).await.unwrap());
        assert!(!svc.asociar_documento(2, id).await.unwrap());

        assert!(matches!(
            svc.asociar_documento(99, id).await.unwrap_err(),
            GestionesError::GestionNoEncontrada(99)
        ));
        assert!(matches!(
            svc.crear_documento(Some(99), archivo("x.txt", b"x")).await.unwrap_err(),
            GestionesError::GestionNoEncontrada(99)
        ));
        assert!(matches!(
            svc.crear_documento(None, archivo("vacio.txt", b"")).await.unwrap_err(),
            GestionesError::Validacion(_)
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
