//! Reglas de las notas de crédito
//!
//! Un pago con forma de pago "Nota De Credito" siempre va de SOS a SM y tiene
//! exactamente una fila en `notas`. La nota queda *pasada* cuando se vincula a
//! una factura; desde ese momento el pago no admite cambios ni borrado.

use crate::domains::error::GestionesError;

pub const FORMA_NOTA_CREDITO: &str = "Nota De Credito";
pub const FORMA_TRANSFERENCIA: &str = "TRANSFERENCIA";

pub const AGENTE_SOS: &str = "SOS";
pub const AGENTE_SM: &str = "SM";
pub const AGENTE_PRESTADOR: &str = "PRESTADOR";

pub fn es_nota_credito(formapago: &str) -> bool {
    formapago.trim().eq_ignore_ascii_case(FORMA_NOTA_CREDITO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoNota {
    SinNota,
    Pendiente,
    Pasada,
}

impl EstadoNota {
    /// Estado a partir de la fila de `notas` (si existe) y su factura.
    pub fn desde(nota_id: Option<i64>, factura_id: Option<i64>) -> Self {
        match (nota_id, factura_id) {
            (None, _) => Self::SinNota,
            (Some(_), None) => Self::Pendiente,
            (Some(_), Some(_)) => Self::Pasada,
        }
    }
}

/// Qué hacer con la fila de `notas` al guardar un pago.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransicionNota {
    Ninguna,
    Crear,
    Conservar,
    Eliminar,
}

/// Decide la transición de la nota cuando el pago pasa a tener (o no) forma
/// de pago "Nota De Credito". Una nota pasada bloquea cualquier cambio.
pub fn transicion(
    pago_id: i64,
    estado: EstadoNota,
    sera_nota: bool,
) -> Result<TransicionNota, GestionesError> {
    match (estado, sera_nota) {
        (EstadoNota::Pasada, _) => Err(GestionesError::NotaPasada { pago_id }),
        (EstadoNota::SinNota, true) => Ok(TransicionNota::Crear),
        (EstadoNota::SinNota, false) => Ok(TransicionNota::Ninguna),
        (EstadoNota::Pendiente, true) => Ok(TransicionNota::Conservar),
        (EstadoNota::Pendiente, false) => Ok(TransicionNota::Eliminar),
    }
}

/// Contrapartes efectivas del pago: las fijas si es nota de crédito.
pub fn contrapartes<'a>(
    formapago: &str,
    pagador: &'a str,
    destinatario: &'a str,
) -> (&'a str, &'a str) {
    if es_nota_credito(formapago) {
        (AGENTE_SOS, AGENTE_SM)
    } else {
        (pagador, destinatario)
    }
}
