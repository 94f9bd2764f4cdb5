//! Modelos de facturas (períodos) y notas de crédito

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domains::error::GestionesError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Factura {
    pub id: i64,
    pub nrofactura: Option<String>,
    pub fechaemitida: NaiveDate,
    pub periodo: i64,
    pub importe: f64,
}

/// Factura con la cantidad e importe total de sus notas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FacturaResumen {
    pub id: i64,
    pub nrofactura: Option<String>,
    pub fechaemitida: NaiveDate,
    pub periodo: i64,
    pub importe: f64,
    pub cantnotas: i64,
    pub importenotas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotaDetalle {
    pub id: i64,
    pub pago_id: i64,
    pub factura_id: Option<i64>,
    pub gestion_id: i64,
    pub fecha: NaiveDate,
    pub importe: f64,
    pub ngestion: i64,
    pub dominio: String,
    pub poliza: String,
    pub cliente: String,
    pub tipo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacturaDetalle {
    #[serde(flatten)]
    pub factura: Factura,
    pub notas: Vec<NotaDetalle>,
}

/// Alta o edición de factura. En el alta con notas, sin `importe` se usa la
/// suma de las notas asignadas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatosFactura {
    pub periodo: i64,
    pub fechaemitida: String,
    pub importe: Option<f64>,
    pub nrofactura: Option<String>,
    #[serde(default)]
    pub nota_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsignacionNotas {
    pub nota_ids: Vec<i64>,
}

/// Valida un período `YYYYMM`.
pub fn validar_periodo(periodo: i64) -> Result<(), GestionesError> {
    let anio = periodo / 100;
    let mes = periodo % 100;
    if (1900..=2999).contains(&anio) && (1..=12).contains(&mes) {
        Ok(())
    } else {
        Err(GestionesError::validacion(format!(
            "Período inválido: {} (se espera AAAAMM)",
            periodo
        )))
    }
}

pub fn validar_importe_factura(importe: f64) -> Result<(), GestionesError> {
    if importe.is_finite() && importe >= 0.0 {
        Ok(())
    } else {
        Err(GestionesError::validacion("El importe de la factura no puede ser negativo"))
    }
}
