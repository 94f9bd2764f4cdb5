//! Modelos de documentos adjuntos a gestiones

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::storage::formatear_tamano;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Documento {
    pub id: i64,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub nombre_archivo: String,
    pub mime_type: String,
    pub tamano: i64,
    pub hash: String,
    pub ruta: String,
    pub creado_por: Option<String>,
    pub creado_en: String,
}

/// Documento tal como se lista, con el tamaño legible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentoListado {
    #[serde(flatten)]
    pub documento: Documento,
    pub tamano_formato: String,
}

impl From<Documento> for DocumentoListado {
    fn from(documento: Documento) -> Self {
        let tamano_formato = formatear_tamano(documento.tamano);
        Self {
            documento,
            tamano_formato,
        }
    }
}

/// Archivo recibido con sus metadatos. Sin título se usa el nombre del archivo.
#[derive(Debug, Clone, Default)]
pub struct DocumentoNuevo {
    pub nombre_archivo: String,
    pub contenido: Vec<u8>,
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub creado_por: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentoSubido {
    pub documento: DocumentoListado,
    pub reutilizado: bool,
    pub vinculado: bool,
    pub mensaje: String,
}
