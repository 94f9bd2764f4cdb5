//! Consulta del listado de pagos

use sqlx::{QueryBuilder, Sqlite};

use super::models::FiltrosPagos;
use crate::domains::gestiones::filters::selector_activo;

/// SELECT base de `PagoDetalle`. Una nota está pasada cuando tiene factura.
pub(crate) const SELECT_PAGO_DETALLE: &str = "SELECT
        p.id,
        p.gestion_id,
        p.fecha,
        ap.agente AS pagador,
        ad.agente AS destinatario,
        fp.formapago,
        p.importe,
        g.tipo,
        g.ngestion,
        g.dominio,
        g.poliza,
        g.cliente,
        n.id AS nota_id,
        n.factura_id,
        (n.id IS NOT NULL AND n.factura_id IS NULL) AS es_nota_credito_no_pasada,
        (n.factura_id IS NOT NULL) AS nota_pasada
    FROM pagos p
    JOIN agentes ap ON ap.id = p.pagador_id
    JOIN agentes ad ON ad.id = p.destinatario_id
    JOIN formaspago fp ON fp.id = p.formapago_id
    JOIN gestiones g ON g.id = p.gestion_id
    LEFT JOIN notas n ON n.pago_id = p.id";

pub fn consulta_pagos(filtros: &FiltrosPagos) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(SELECT_PAGO_DETALLE);
    qb.push(" WHERE 1=1");

    let texto = filtros.texto_busqueda.trim();
    if !texto.is_empty() {
        let patron = format!("%{}%", texto);
        qb.push(" AND (");
        for (i, columna) in [
            "g.ngestion",
            "g.dominio",
            "g.poliza",
            "g.cliente",
            "ap.agente",
            "ad.agente",
            "fp.formapago",
        ]
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

    if selector_activo(&filtros.pagador) {
        qb.push(" AND ap.agente = ").push_bind(filtros.pagador.trim().to_string());
    }

    if selector_activo(&filtros.destinatario) {
        qb.push(" AND ad.agente = ").push_bind(filtros.destinatario.trim().to_string());
    }

    if selector_activo(&filtros.formapago) {
        qb.push(" AND fp.formapago = ").push_bind(filtros.formapago.trim().to_string());
    }

    if filtros.es_nota_credito_no_pasada {
        qb.push(" AND n.id IS NOT NULL AND n.factura_id IS NULL");
    }

    qb.push(" ORDER BY p.fecha DESC, p.id DESC");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectores_all_no_filtran() {
        let qb = consulta_pagos(&FiltrosPagos::default());
        let sql = qb.sql();
        assert!(!sql.contains("ap.agente ="));
        assert!(!sql.contains("fp.formapago ="));
        assert!(sql.ends_with("WHERE 1=1 ORDER BY p.fecha DESC, p.id DESC"));
    }

    #[test]
    fn nota_no_pasada_y_pagador() {
        let filtros = FiltrosPagos {
            pagador: "SOS".to_string(),
            es_nota_credito_no_pasada: true,
            ..Default::default()
        };
        let qb = consulta_pagos(&filtros);
        let sql = qb.sql();
        assert!(sql.contains("AND ap.agente = ?"));
        assert!(sql.contains("AND n.id IS NOT NULL AND n.factura_id IS NULL"));
    }
}
