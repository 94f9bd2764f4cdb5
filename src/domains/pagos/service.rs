use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::filters::{consulta_pagos, SELECT_PAGO_DETALLE};
use super::models::{
    parsear_fecha, validar_importe, CambiosPago, FiltrosPagos, NuevoPago, PagoActual, PagoDetalle,
};
use super::nota_credito::{
    contrapartes, es_nota_credito, transicion, EstadoNota, TransicionNota, FORMA_NOTA_CREDITO,
};
use crate::domains::catalogos::{agente_id_por_nombre, formapago_id_por_nombre};
use crate::domains::error::{GestionesError, GestionesResult};

/// Servicio de pagos y del ciclo de vida de sus notas de crédito
pub struct PagoService {
    db: SqlitePool,
}

impl PagoService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn filtrar_pagos(&self, filtros: &FiltrosPagos) -> GestionesResult<Vec<PagoDetalle>> {
        let mut qb = consulta_pagos(filtros);
        let pagos = qb
            .build_query_as::<PagoDetalle>()
            .fetch_all(&self.db)
            .await?;
        Ok(pagos)
    }

    pub async fn obtener_pago_por_id(&self, pago_id: i64) -> GestionesResult<PagoDetalle> {
        sqlx::query_as::<_, PagoDetalle>(&format!("{} WHERE p.id = ?", SELECT_PAGO_DETALLE))
            .bind(pago_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GestionesError::PagoNoEncontrado(pago_id))
    }

    pub async fn obtener_pagos_por_gestion(&self, gestion_id: i64) -> GestionesResult<Vec<PagoDetalle>> {
        let pagos = sqlx::query_as::<_, PagoDetalle>(&format!(
            "{} WHERE p.gestion_id = ? ORDER BY p.fecha DESC, p.id DESC",
            SELECT_PAGO_DETALLE
        ))
        .bind(gestion_id)
        .fetch_all(&self.db)
        .await?;
        Ok(pagos)
    }

    /// Alta de un pago. Si es nota de crédito se fuerzan SOS → SM y se crea la
    /// nota pendiente en la misma transacción.
    pub async fn crear_pago(&self, nuevo: &NuevoPago) -> GestionesResult<PagoDetalle> {
        let fecha = parsear_fecha(&nuevo.fecha)?;
        validar_importe(nuevo.importe)?;

        let mut tx = self.db.begin().await?;

        let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM gestiones WHERE id = ?")
            .bind(nuevo.gestion_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existe.is_none() {
            return Err(GestionesError::GestionNoEncontrada(nuevo.gestion_id));
        }

        let pago_id = insertar_pago(
            &mut tx,
            nuevo.gestion_id,
            fecha,
            &nuevo.pagador,
            &nuevo.destinatario,
            &nuevo.formapago,
            nuevo.importe,
        )
        .await?;

        tx.commit().await?;

        info!(pago_id, gestion_id = nuevo.gestion_id, formapago = %nuevo.formapago, "💰 Pago creado");
        self.obtener_pago_por_id(pago_id).await
    }

    /// Actualización parcial. Rechazada si la nota del pago ya fue pasada;
    /// crea o borra la nota cuando cambia la forma de pago.
    pub async fn actualizar_pago(&self, pago_id: i64, cambios: &CambiosPago) -> GestionesResult<PagoDetalle> {
        if cambios.esta_vacio() {
            return Err(GestionesError::validacion("No hay campos para actualizar"));
        }

        let fecha = cambios.fecha.as_deref().map(parsear_fecha).transpose()?;
        if let Some(importe) = cambios.importe {
            validar_importe(importe)?;
        }

        let mut tx = self.db.begin().await?;

        let actual = pago_actual(&mut tx, pago_id).await?;
        let estado = EstadoNota::desde(actual.nota_id, actual.factura_id);

        let formapago = cambios.formapago.as_deref().unwrap_or(&actual.formapago);
        let sera_nota = es_nota_credito(formapago);

        let paso = transicion(pago_id, estado, sera_nota).map_err(|e| {
            warn!(pago_id, "🚫 Edición rechazada: nota de crédito ya pasada");
            e
        })?;

        let (pagador, destinatario) = contrapartes(
            formapago,
            cambios.pagador.as_deref().unwrap_or(&actual.pagador),
            cambios.destinatario.as_deref().unwrap_or(&actual.destinatario),
        );

        let pagador_id = requerir_agente(&mut tx, pagador).await?;
        let destinatario_id = requerir_agente(&mut tx, destinatario).await?;
        let formapago_id = requerir_formapago(&mut tx, formapago).await?;

        sqlx::query(
            "UPDATE pagos
             SET fecha = ?, pagador_id = ?, destinatario_id = ?, formapago_id = ?, importe = ?
             WHERE id = ?",
        )
        .bind(fecha.unwrap_or(actual.fecha))
        .bind(pagador_id)
        .bind(destinatario_id)
        .bind(formapago_id)
        .bind(cambios.importe.unwrap_or(actual.importe))
        .bind(pago_id)
        .execute(&mut *tx)
        .await?;

        match paso {
            TransicionNota::Crear => {
                sqlx::query("INSERT INTO notas (pago_id) VALUES (?)")
                    .bind(pago_id)
                    .execute(&mut *tx)
                    .await?;
                info!(pago_id, "📝 Nota de crédito creada");
            }
            TransicionNota::Eliminar => {
                sqlx::query("DELETE FROM notas WHERE pago_id = ? AND factura_id IS NULL")
                    .bind(pago_id)
                    .execute(&mut *tx)
                    .await?;
                info!(pago_id, "🗑️ Nota de crédito eliminada");
            }
            TransicionNota::Conservar | TransicionNota::Ninguna => {}
        }

        tx.commit().await?;

        info!(pago_id, "✏️ Pago actualizado");
        self.obtener_pago_por_id(pago_id).await
    }

    /// Borra el pago y su nota pendiente. Una nota pasada lo impide.
    pub async fn eliminar_pago(&self, pago_id: i64) -> GestionesResult<()> {
        let mut tx = self.db.begin().await?;

        let actual = pago_actual(&mut tx, pago_id).await?;
        if EstadoNota::desde(actual.nota_id, actual.factura_id) == EstadoNota::Pasada {
            warn!(pago_id, "🚫 Borrado rechazado: nota de crédito ya pasada");
            return Err(GestionesError::NotaPasada { pago_id });
        }

        sqlx::query("DELETE FROM notas WHERE pago_id = ?")
            .bind(pago_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pagos WHERE id = ?")
            .bind(pago_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(pago_id, "🗑️ Pago eliminado");
        Ok(())
    }
}

/// Inserta un pago dentro de una transacción abierta aplicando las reglas de
/// nota de crédito. Devuelve el id del pago.
pub(crate) async fn insertar_pago(
    conn: &mut SqliteConnection,
    gestion_id: i64,
    fecha: NaiveDate,
    pagador: &str,
    destinatario: &str,
    formapago: &str,
    importe: f64,
) -> GestionesResult<i64> {
    validar_importe(importe)?;

    let (pagador, destinatario) = contrapartes(formapago, pagador, destinatario);
    let pagador_id = requerir_agente(conn, pagador).await?;
    let destinatario_id = requerir_agente(conn, destinatario).await?;
    let formapago_id = requerir_formapago(conn, formapago).await?;

    let pago_id = sqlx::query(
        "INSERT INTO pagos (gestion_id, fecha, pagador_id, destinatario_id, formapago_id, importe)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(gestion_id)
    .bind(fecha)
    .bind(pagador_id)
    .bind(destinatario_id)
    .bind(formapago_id)
    .bind(importe)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    if es_nota_credito(formapago) {
        sqlx::query("INSERT INTO notas (pago_id) VALUES (?)")
            .bind(pago_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(pago_id)
}

async fn pago_actual(conn: &mut SqliteConnection, pago_id: i64) -> GestionesResult<PagoActual> {
    sqlx::query_as::<_, PagoActual>(
        "SELECT p.fecha, ap.agente AS pagador, ad.agente AS destinatario, fp.formapago,
                p.importe, n.id AS nota_id, n.factura_id
         FROM pagos p
         JOIN agentes ap ON ap.id = p.pagador_id
         JOIN agentes ad ON ad.id = p.destinatario_id
         JOIN formaspago fp ON fp.id = p.formapago_id
         LEFT JOIN notas n ON n.pago_id = p.id
         WHERE p.id = ?",
    )
    .bind(pago_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(GestionesError::PagoNoEncontrado(pago_id))
}

async fn requerir_agente(conn: &mut SqliteConnection, nombre: &str) -> GestionesResult<i64> {
    let nombre = nombre.trim();
    if nombre.is_empty() {
        return Err(GestionesError::validacion("El pagador y el destinatario son obligatorios"));
    }
    agente_id_por_nombre(&mut *conn, nombre)
        .await?
        .ok_or_else(|| GestionesError::AgenteInexistente(nombre.to_string()))
}

async fn requerir_formapago(conn: &mut SqliteConnection, nombre: &str) -> GestionesResult<i64> {
    let nombre = nombre.trim();
    if nombre.is_empty() {
        return Err(GestionesError::validacion("La forma de pago es obligatoria"));
    }
    // La regla de nota de crédito no distingue mayúsculas; el catálogo sí
    let nombre = if es_nota_credito(nombre) { FORMA_NOTA_CREDITO } else { nombre };
    formapago_id_por_nombre(&mut *conn, nombre)
        .await?
        .ok_or_else(|| GestionesError::FormaPagoInexistente(nombre.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use shared::DatabaseService;

    async fn setup() -> (PagoService, SqlitePool) {
        let db = DatabaseService::in_memory().await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        let pool = db.pool().clone();
        sqlx::query(
            "INSERT INTO gestiones (id, fecha, cliente, dominio, poliza, tipo)
             VALUES (1, '2024-05-10', 'Perez', 'AB123CD', 'POL-1', 'Normal')",
        )
        .execute(&pool)
        .await
        .unwrap();
        (PagoService::new(pool.clone()), pool)
    }

    fn nuevo(formapago: &str) -> NuevoPago {
        NuevoPago {
            gestion_id: 1,
            fecha: "2024-05-11".to_string(),
            pagador: "PRESTADOR".to_string(),
            destinatario: "SOS".to_string(),
            formapago: formapago.to_string(),
            importe: 1500.0,
        }
    }

    async fn pasar_nota(pool: &SqlitePool, pago_id: i64) {
        let factura_id = sqlx::query(
            "INSERT INTO facturas (fechaemitida, periodo, importe) VALUES ('2024-06-01', 202406, 0)",
        )
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();
        sqlx::query("UPDATE notas SET factura_id = ? WHERE pago_id = ?")
            .bind(factura_id)
            .bind(pago_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn nota_de_credito_fuerza_contrapartes_y_crea_nota() {
        let (svc, _) = setup().await;
        let pago = svc.crear_pago(&nuevo("Nota De Credito")).await.unwrap();

        assert_eq!(pago.pagador, "SOS");
        assert_eq!(pago.destinatario, "SM");
        assert!(pago.nota_id.is_some());
        assert!(pago.es_nota_credito_no_pasada);
        assert!(!pago.nota_pasada);
    }

    #[tokio::test]
    async fn nota_de_credito_en_minusculas_usa_la_forma_del_catalogo() {
        let (svc, _) = setup().await;
        let pago = svc.crear_pago(&nuevo("nota de credito")).await.unwrap();

        assert_eq!(pago.formapago, "Nota De Credito");
        assert_eq!(pago.destinatario, "SM");
        assert!(pago.nota_id.is_some());
    }

    #[tokio::test]
    async fn pago_comun_respeta_contrapartes() {
        let (svc, _) = setup().await;
        let pago = svc.crear_pago(&nuevo("TRANSFERENCIA")).await.unwrap();

        assert_eq!(pago.pagador, "PRESTADOR");
        assert_eq!(pago.destinatario, "SOS");
        assert!(pago.nota_id.is_none());
        assert!(!pago.es_nota_credito_no_pasada);
    }

    #[tokio::test]
    async fn alta_rechaza_datos_invalidos() {
        let (svc, _) = setup().await;

        let mut sin_importe = nuevo("EFECTIVO");
        sin_importe.importe = 0.0;
        assert!(matches!(
            svc.crear_pago(&sin_importe).await.unwrap_err(),
            GestionesError::Validacion(_)
        ));

        let mut sin_gestion = nuevo("EFECTIVO");
        sin_gestion.gestion_id = 99;
        assert!(matches!(
            svc.crear_pago(&sin_gestion).await.unwrap_err(),
            GestionesError::GestionNoEncontrada(99)
        ));

        let mut agente_raro = nuevo("EFECTIVO");
        agente_raro.pagador = "NADIE".to_string();
        assert!(matches!(
            svc.crear_pago(&agente_raro).await.unwrap_err(),
            GestionesError::AgenteInexistente(_)
        ));
    }

    #[tokio::test]
    async fn pasar_a_nota_de_credito_crea_nota_y_volver_la_borra() {
        let (svc, pool) = setup().await;
        let pago = svc.crear_pago(&nuevo("TRANSFERENCIA")).await.unwrap();

        let cambio = CambiosPago {
            formapago: Some("Nota De Credito".to_string()),
            ..Default::default()
        };
        let actualizado = svc.actualizar_pago(pago.id, &cambio).await.unwrap();
        assert_eq!(actualizado.pagador, "SOS");
        assert_eq!(actualizado.destinatario, "SM");
        assert!(actualizado.es_nota_credito_no_pasada);

        let vuelta = CambiosPago {
            formapago: Some("EFECTIVO".to_string()),
            destinatario: Some("PRESTADOR".to_string()),
            ..Default::default()
        };
        let actualizado = svc.actualizar_pago(pago.id, &vuelta).await.unwrap();
        assert!(actualizado.nota_id.is_none());
        assert_eq!(actualizado.destinatario, "PRESTADOR");

        let notas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notas")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(notas, 0);
    }

    #[tokio::test]
    async fn nota_pasada_bloquea_edicion_y_borrado() {
        let (svc, pool) = setup().await;
        let pago = svc.crear_pago(&nuevo("Nota De Credito")).await.unwrap();
        pasar_nota(&pool, pago.id).await;

        let cambio = CambiosPago {
            importe: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(
            svc.actualizar_pago(pago.id, &cambio).await.unwrap_err(),
            GestionesError::NotaPasada { .. }
        ));
        assert!(matches!(
            svc.eliminar_pago(pago.id).await.unwrap_err(),
            GestionesError::NotaPasada { .. }
        ));

        let intacto = svc.obtener_pago_por_id(pago.id).await.unwrap();
        assert_eq!(intacto.importe, 1500.0);
        assert!(intacto.nota_pasada);
    }

    #[tokio::test]
    async fn eliminar_pago_borra_su_nota_pendiente() {
        let (svc, pool) = setup().await;
        let pago = svc.crear_pago(&nuevo("Nota De Credito")).await.unwrap();

        svc.eliminar_pago(pago.id).await.unwrap();

        let notas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notas")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(notas, 0);
        assert!(matches!(
            svc.obtener_pago_por_id(pago.id).await.unwrap_err(),
            GestionesError::PagoNoEncontrado(_)
        ));
        assert!(matches!(
            svc.eliminar_pago(pago.id).await.unwrap_err(),
            GestionesError::PagoNoEncontrado(_)
        ));
    }

    #[tokio::test]
    async fn filtro_de_notas_no_pasadas() {
        let (svc, pool) = setup().await;
        let comun = svc.crear_pago(&nuevo("TRANSFERENCIA")).await.unwrap();
        let pendiente = svc.crear_pago(&nuevo("Nota De Credito")).await.unwrap();
        let pasada = svc.crear_pago(&nuevo("Nota De Credito")).await.unwrap();
        pasar_nota(&pool, pasada.id).await;

        let filtros = FiltrosPagos {
            es_nota_credito_no_pasada: true,
            ..Default::default()
        };
        let ids: Vec<i64> = svc
            .filtrar_pagos(&filtros)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![pendiente.id]);

        let filtros = FiltrosPagos {
            texto_busqueda: "perez".to_string(),
            destinatario: "SOS".to_string(),
            ..Default::default()
        };
        let ids: Vec<i64> = svc
            .filtrar_pagos(&filtros)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![comun.id]);
    }
}
