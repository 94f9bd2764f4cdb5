//! Modelos de pagos

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domains::error::GestionesError;

/// Pago con los nombres de agentes y forma de pago y los datos de su gestión.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PagoDetalle {
    pub id: i64,
    pub gestion_id: i64,
    pub fecha: NaiveDate,
    pub pagador: String,
    pub destinatario: String,
    pub formapago: String,
    pub importe: f64,
    pub tipo: String,
    pub ngestion: i64,
    pub dominio: String,
    pub poliza: String,
    pub cliente: String,
    pub nota_id: Option<i64>,
    pub factura_id: Option<i64>,
    pub es_nota_credito_no_pasada: bool,
    pub nota_pasada: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuevoPago {
    pub gestion_id: i64,
    pub fecha: String,
    #[serde(default)]
    pub pagador: String,
    #[serde(default)]
    pub destinatario: String,
    pub formapago: String,
    pub importe: f64,
}

/// Cambios parciales de un pago; los campos ausentes conservan su valor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CambiosPago {
    pub fecha: Option<String>,
    pub pagador: Option<String>,
    pub destinatario: Option<String>,
    pub formapago: Option<String>,
    pub importe: Option<f64>,
}

impl CambiosPago {
    pub fn esta_vacio(&self) -> bool {
        self.fecha.is_none()
            && self.pagador.is_none()
            && self.destinatario.is_none()
            && self.formapago.is_none()
            && self.importe.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltrosPagos {
    pub texto_busqueda: String,
    pub pagador: String,
    pub destinatario: String,
    pub formapago: String,
    pub es_nota_credito_no_pasada: bool,
}

impl Default for FiltrosPagos {
    fn default() -> Self {
        Self {
            texto_busqueda: String::new(),
            pagador: "all".to_string(),
            destinatario: "all".to_string(),
            formapago: "all".to_string(),
            es_nota_credito_no_pasada: false,
        }
    }
}

/// Estado guardado de un pago, leído antes de modificarlo.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PagoActual {
    pub fecha: NaiveDate,
    pub pagador: String,
    pub destinatario: String,
    pub formapago: String,
    pub importe: f64,
    pub nota_id: Option<i64>,
    pub factura_id: Option<i64>,
}

pub fn parsear_fecha(fecha: &str) -> Result<NaiveDate, GestionesError> {
    NaiveDate::parse_from_str(fecha.trim(), "%Y-%m-%d")
        .map_err(|_| GestionesError::validacion(format!("Formato de fecha inválido: {}", fecha)))
}

pub fn validar_importe(importe: f64) -> Result<(), GestionesError> {
    if importe.is_finite() && importe > 0.0 {
        Ok(())
    } else {
        Err(GestionesError::validacion("El importe debe ser mayor a 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fecha_iso_obligatoria() {
        assert_eq!(
            parsear_fecha("2024-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(parsear_fecha("05/03/2024").is_err());
        assert!(parsear_fecha("").is_err());
    }

    #[test]
    fn importe_positivo() {
        assert!(validar_importe(0.01).is_ok());
        assert!(validar_importe(0.0).is_err());
        assert!(validar_importe(-5.0).is_err());
        assert!(validar_importe(f64::NAN).is_err());
    }

    #[test]
    fn cambios_vacios() {
        assert!(CambiosPago::default().esta_vacio());
        let cambios = CambiosPago {
            importe: Some(10.0),
            ..Default::default()
        };
        assert!(!cambios.esta_vacio());
    }
}
