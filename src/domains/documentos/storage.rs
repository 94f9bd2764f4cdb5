//! Almacén de archivos direccionado por contenido
//!
//! Cada archivo se guarda como `<dir>/<sha256><extensión>`; subir dos veces el
//! mismo contenido no duplica el archivo.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ArchivoGuardado {
    pub hash: String,
    pub ruta: String,
    pub tamano: i64,
    pub mime_type: String,
    pub ya_existia: bool,
}

#[derive(Debug, Clone)]
pub struct AlmacenDocumentos {
    dir: PathBuf,
}

impl AlmacenDocumentos {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn guardar(&self, nombre_archivo: &str, contenido: &[u8]) -> std::io::Result<ArchivoGuardado> {
        let hash = calcular_hash(contenido);
        let destino = self.dir.join(format!("{}{}", hash, extension(nombre_archivo)));

        tokio::fs::create_dir_all(&self.dir).await?;
        let ya_existia = tokio::fs::try_exists(&destino).await?;
        if !ya_existia {
            tokio::fs::write(&destino, contenido).await?;
        }
        debug!(ruta = %destino.display(), ya_existia, "Archivo de documento guardado");

        Ok(ArchivoGuardado {
            hash,
            ruta: destino.to_string_lossy().into_owned(),
            tamano: contenido.len() as i64,
            mime_type: detectar_mime(nombre_archivo),
            ya_existia,
        })
    }

    pub async fn leer(&self, ruta: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(ruta).await
    }
}

pub fn calcular_hash(contenido: &[u8]) -> String {
    hex::encode(Sha256::digest(contenido))
}

/// Extensión con el punto, tal como viene en el nombre (`".pdf"`), o vacía.
pub fn extension(nombre_archivo: &str) -> String {
    Path::new(nombre_archivo)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

pub fn detectar_mime(nombre_archivo: &str) -> String {
    let ext = extension(nombre_archivo).to_ascii_lowercase();
    match ext.as_str() {
        ".pdf" => mime::APPLICATION_PDF.to_string(),
        ".jpg" | ".jpeg" => mime::IMAGE_JPEG.to_string(),
        ".png" => mime::IMAGE_PNG.to_string(),
        ".gif" => mime::IMAGE_GIF.to_string(),
        ".txt" => mime::TEXT_PLAIN.to_string(),
        ".csv" => mime::TEXT_CSV.to_string(),
        ".doc" => "application/msword".to_string(),
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
        ".xls" => "application/vnd.ms-excel".to_string(),
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}

/// Tamaño legible con un decimal: B, KB, MB, GB o TB.
pub fn formatear_tamano(bytes: i64) -> String {
    let mut valor = bytes as f64;
    for unidad in ["B", "KB", "MB", "GB"] {
        if valor < 1024.0 {
            return format!("{:.1} {}", valor, unidad);
        }
        valor /= 1024.0;
    }
    format!("{:.1} TB", valor)
}
