//! Construcción del WHERE del listado de gestiones

use sqlx::{QueryBuilder, Sqlite};

use super::models::FiltrosGestiones;

pub(crate) const COLUMNAS_GESTION: &str = "g.id, g.ngestion, g.fecha, g.cliente, g.dominio, g.poliza, g.tipo, \
     g.motivo, g.ncaso, g.usuariocarga, g.usuariorespuesta, g.estado, g.itr, g.totalfactura, \
     g.terminado, g.fechaterminado, g.obs, g.activa";

const EXISTE_PAGO: &str = "EXISTS (SELECT 1 FROM pagos p WHERE p.gestion_id = g.id)";

const EXISTE_NOTA: &str = "EXISTS (SELECT 1 FROM pagos p JOIN notas n ON n.pago_id = p.id \
     WHERE p.gestion_id = g.id)";

const EXISTE_NOTA_PASADA: &str = "EXISTS (SELECT 1 FROM pagos p JOIN notas n ON n.pago_id = p.id \
     WHERE p.gestion_id = g.id AND n.factura_id IS NOT NULL)";

/// Resuelve un par de casillas excluyentes: `Some(true)` si sólo está marcada
/// la positiva, `Some(false)` si sólo la negativa, `None` en otro caso.
pub fn criterio_par(si: bool, no: bool) -> Option<bool> {
    match (si, no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

/// `true` si el valor de un selector debe filtrar (no vacío ni "all").
pub fn selector_activo(valor: &str) -> bool {
    let valor = valor.trim();
    !valor.is_empty() && !valor.eq_ignore_ascii_case("all")
}

pub fn consulta_gestiones(filtros: &FiltrosGestiones) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM gestiones g WHERE 1=1", COLUMNAS_GESTION));

    if selector_activo(&filtros.tipo) {
        qb.push(" AND g.tipo = ").push_bind(filtros.tipo.trim().to_string());
    }

    let texto = filtros.texto_busqueda.trim();
    if !texto.is_empty() {
        let patron = format!("%{}%", texto);
        qb.push(" AND (");
        for (i, columna) in ["g.ngestion", "g.cliente", "g.dominio", "g.poliza", "g.obs"]
            .iter()
            .enumerate()
        {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*columna).push(" LIKE ").push_bind(patron.clone());
        }
        qb.push(")");
    }

    if let Some(activa) = criterio_par(filtros.activa, filtros.no_activa) {
        qb.push(" AND g.activa = ").push_bind(activa);
    }

    if let Some(terminado) = criterio_par(filtros.terminado, filtros.no_terminado) {
        qb.push(" AND g.terminado = ").push_bind(terminado);
    }

    if let Some(con_pagos) = criterio_par(filtros.con_pagos, filtros.sin_pagos) {
        qb.push(if con_pagos { " AND " } else { " AND NOT " }).push(EXISTE_PAGO);
    }

    if let Some(con_nota) = criterio_par(filtros.con_nota, filtros.sin_nota) {
        qb.push(if con_nota { " AND " } else { " AND NOT " }).push(EXISTE_NOTA);
    }

    if filtros.con_nota_pasada {
        qb.push(" AND ").push(EXISTE_NOTA_PASADA);
    }

    qb.push(" ORDER BY g.fecha DESC, g.id DESC");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn par_solo_filtra_con_una_casilla() {
        assert_eq!(criterio_par(true, false), Some(true));
        assert_eq!(criterio_par(false, true), Some(false));
        assert_eq!(criterio_par(true, true), None);
        assert_eq!(criterio_par(false, false), None);
    }

    #[test]
    fn sin_criterios_solo_ordena() {
        let filtros = FiltrosGestiones {
            activa: false,
            ..Default::default()
        };
        let qb = consulta_gestiones(&filtros);
        assert!(qb.sql().ends_with("WHERE 1=1 ORDER BY g.fecha DESC, g.id DESC"));
    }

    #[test]
    fn tipo_all_se_ignora() {
        let filtros = FiltrosGestiones {
            tipo: "All".to_string(),
            ..Default::default()
        };
        assert!(!consulta_gestiones(&filtros).sql().contains("g.tipo ="));
    }

    #[test]
    fn sin_nota_niega_la_subconsulta() {
        let filtros = FiltrosGestiones {
            sin_nota: true,
            texto_busqueda: "abc".to_string(),
            ..Default::default()
        };
        let qb = consulta_gestiones(&filtros);
        let sql = qb.sql();
        assert!(sql.contains("AND NOT EXISTS (SELECT 1 FROM pagos p JOIN notas n"));
        assert!(sql.contains("g.obs LIKE ?"));
        assert!(sql.contains("g.activa = ?"));
    }
}
