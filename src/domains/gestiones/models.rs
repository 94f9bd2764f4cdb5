//! Modelos de gestiones (casos de siniestros)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Gestion {
    pub id: i64,
    pub ngestion: i64,
    pub fecha: NaiveDate,
    pub cliente: String,
    pub dominio: String,
    pub poliza: String,
    pub tipo: String,
    pub motivo: String,
    pub ncaso: i64,
    pub usuariocarga: String,
    pub usuariorespuesta: String,
    pub estado: Option<String>,
    pub itr: i64,
    pub totalfactura: f64,
    pub terminado: bool,
    pub fechaterminado: Option<NaiveDate>,
    pub obs: String,
    pub activa: bool,
}

/// Datos de alta o edición de una gestión.
///
/// `terminado` y `activa` son opcionales: en una edición, si no vienen se
/// conserva el valor guardado; un alta individual siempre usa `false` y `true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DatosGestion {
    #[serde(default)]
    pub ngestion: i64,
    #[validate(required(message = "La fecha es obligatoria"))]
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub dominio: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "La póliza es obligatoria"))]
    pub poliza: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "El tipo es obligatorio"))]
    pub tipo: String,
    #[serde(default)]
    pub motivo: String,
    #[serde(default)]
    pub ncaso: i64,
    #[serde(default)]
    pub usuariocarga: String,
    #[serde(default)]
    pub usuariorespuesta: String,
    pub estado: Option<String>,
    #[serde(default)]
    pub itr: i64,
    #[serde(default)]
    pub totalfactura: f64,
    pub terminado: Option<bool>,
    pub fechaterminado: Option<NaiveDate>,
    #[serde(default)]
    pub obs: String,
    pub activa: Option<bool>,
}

impl DatosGestion {
    /// Recorta espacios y normaliza el dominio (mayúsculas, sin espacios).
    pub fn normalizar(mut self) -> Self {
        self.poliza = self.poliza.trim().to_string();
        self.tipo = self.tipo.trim().to_string();
        self.cliente = self.cliente.trim().to_string();
        self.dominio = normalizar_dominio(&self.dominio);
        self.estado = self
            .estado
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

pub fn normalizar_dominio(dominio: &str) -> String {
    dominio
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Criterios del listado de gestiones. Los pares (`terminado`/`no_terminado`,
/// `activa`/`no_activa`, ...) sólo filtran cuando exactamente uno está marcado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltrosGestiones {
    pub texto_busqueda: String,
    pub tipo: String,
    pub terminado: bool,
    pub no_terminado: bool,
    pub activa: bool,
    pub no_activa: bool,
    pub con_pagos: bool,
    pub sin_pagos: bool,
    pub con_nota: bool,
    pub sin_nota: bool,
    pub con_nota_pasada: bool,
}

impl Default for FiltrosGestiones {
    fn default() -> Self {
        Self {
            texto_busqueda: String::new(),
            tipo: "all".to_string(),
            terminado: false,
            no_terminado: false,
            activa: true,
            no_activa: false,
            con_pagos: false,
            sin_pagos: false,
            con_nota: false,
            sin_nota: false,
            con_nota_pasada: false,
        }
    }
}

/// Fila de la carga masiva. Con `id` se actualiza la gestión existente.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilaMasiva {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub datos: DatosGestion,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GestionesMasivas {
    pub gestiones: Vec<FilaMasiva>,
    #[serde(default)]
    pub generar_pagos: bool,
    #[serde(default)]
    pub documento_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultadoMasivo {
    pub creadas: Vec<i64>,
    pub actualizadas: Vec<i64>,
    pub pagos_creados: usize,
    pub documentos_asociados: usize,
    pub fallos: Vec<String>,
}

impl ResultadoMasivo {
    pub fn mensaje(&self) -> String {
        let mut partes = Vec::new();
        if !self.creadas.is_empty() {
            partes.push(format!("{} gestiones creadas", self.creadas.len()));
        }
        if !self.actualizadas.is_empty() {
            partes.push(format!("{} gestiones actualizadas", self.actualizadas.len()));
        }
        if self.pagos_creados > 0 {
            partes.push(format!("{} pagos generados", self.pagos_creados));
        }
        if self.documentos_asociados > 0 {
            partes.push(format!("{} documentos asociados", self.documentos_asociados));
        }
        if !self.fallos.is_empty() {
            partes.push(format!("{} fallos", self.fallos.len()));
        }
        if partes.is_empty() {
            "Sin cambios".to_string()
        } else {
            partes.join(", ")
        }
    }
}
