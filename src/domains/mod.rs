pub mod catalogos;
pub mod documentos;
pub mod error;
pub mod gestiones;
pub mod pagos;
pub mod periodos;

pub use error::{GestionesError, GestionesResult};

use validator::ValidationErrors;

/// Mensajes legibles de un `ValidationErrors`, ordenados por campo.
pub fn mensajes_validacion(errores: &ValidationErrors) -> Vec<String> {
    let mut campos: Vec<_> = errores.field_errors().into_iter().collect();
    campos.sort_by(|a, b| a.0.cmp(&b.0));

    campos
        .into_iter()
        .flat_map(|(campo, errores)| {
            errores.iter().map(move |e| match &e.message {
                Some(mensaje) => mensaje.to_string(),
                None => format!("{}: valor inválido", campo),
            })
        })
        .collect()
}
