//! Errores de negocio de gestiones, pagos, períodos y documentos

#[derive(Debug, thiserror::Error)]
pub enum GestionesError {
    #[error("Gestión {0} no encontrada")]
    GestionNoEncontrada(i64),

    #[error("Pago {0} no encontrado")]
    PagoNoEncontrado(i64),

    #[error("Factura {0} no encontrada")]
    FacturaNoEncontrada(i64),

    #[error("Nota {0} no encontrada")]
    NotaNoEncontrada(i64),

    #[error("Documento {0} no encontrado")]
    DocumentoNoEncontrado(i64),

    #[error("No existe el agente '{0}'")]
    AgenteInexistente(String),

    #[error("No existe la forma de pago '{0}'")]
    FormaPagoInexistente(String),

    #[error("El pago {pago_id} es una Nota De Credito ya pasada a SOS y no puede modificarse ni eliminarse")]
    NotaPasada { pago_id: i64 },

    #[error("La gestión {gestion_id} tiene {cantidad} nota(s) de crédito ya pasadas y no puede eliminarse")]
    GestionConNotasPasadas { gestion_id: i64, cantidad: i64 },

    #[error("La nota {nota_id} ya está asignada a la factura {factura_id}")]
    NotaYaAsignada { nota_id: i64, factura_id: i64 },

    #[error("{0}")]
    Validacion(String),

    #[error("Errores de validación: {}", .0.join("; "))]
    ValidacionLote(Vec<String>),

    #[error("Error de archivo: {0}")]
    Archivo(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl GestionesError {
    pub fn validacion(message: impl Into<String>) -> Self {
        Self::Validacion(message.into())
    }

    pub fn es_no_encontrado(&self) -> bool {
        matches!(
            self,
            Self::GestionNoEncontrada(_)
                | Self::PagoNoEncontrado(_)
                | Self::FacturaNoEncontrada(_)
                | Self::NotaNoEncontrada(_)
                | Self::DocumentoNoEncontrado(_)
        )
    }

    /// Reglas de negocio que rechazan la operación sobre datos válidos.
    pub fn es_conflicto(&self) -> bool {
        matches!(
            self,
            Self::NotaPasada { .. } | Self::GestionConNotasPasadas { .. } | Self::NotaYaAsignada { .. }
        )
    }
}

impl From<sqlx::Error> for GestionesError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for GestionesError {
    fn from(err: std::io::Error) -> Self {
        Self::Archivo(err.to_string())
    }
}

pub type GestionesResult<T> = Result<T, GestionesError>;
