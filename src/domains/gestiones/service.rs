use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use validator::Validate;

use super::filters::{consulta_gestiones, COLUMNAS_GESTION};
use super::models::{DatosGestion, FiltrosGestiones, Gestion};
use crate::domains::error::{GestionesError, GestionesResult};
use crate::domains::mensajes_validacion;

/// Servicio de alta, edición, baja y búsqueda de gestiones
pub struct GestionService {
    pub(super) db: SqlitePool,
}

impl GestionService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn filter_gestiones(&self, filtros: &FiltrosGestiones) -> GestionesResult<Vec<Gestion>> {
        let mut qb = consulta_gestiones(filtros);
        debug!(sql = qb.sql(), "Filtrando gestiones");
        let gestiones = qb.build_query_as::<Gestion>().fetch_all(&self.db).await?;
        Ok(gestiones)
    }

    pub async fn obtener_gestion_por_id(&self, gestion_id: i64) -> GestionesResult<Gestion> {
        sqlx::query_as::<_, Gestion>(&format!(
            "SELECT {} FROM gestiones g WHERE g.id = ?",
            COLUMNAS_GESTION
        ))
        .bind(gestion_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GestionesError::GestionNoEncontrada(gestion_id))
    }

    /// Da de alta una gestión. Toda gestión nueva nace activa y sin terminar.
    pub async fn crear_gestion(&self, mut datos: DatosGestion) -> GestionesResult<Gestion> {
        datos.terminado = Some(false);
        datos.activa = Some(true);
        datos.fechaterminado = None;
        let datos = preparar(datos)?;
        let gestion_id = {
            let mut conn = self.db.acquire().await?;
            insertar_gestion(&mut conn, &datos).await?
        };

        info!(gestion_id, poliza = %datos.poliza, "📁 Gestión creada");
        self.obtener_gestion_por_id(gestion_id).await
    }

    /// Edita una gestión. `terminado` y `activa` ausentes conservan su valor;
    /// al terminarla sin fecha se usa la de hoy, al reabrirla se limpia.
    pub async fn actualizar_gestion(&self, gestion_id: i64, datos: DatosGestion) -> GestionesResult<Gestion> {
        let datos = preparar(datos)?;
        let mut tx = self.db.begin().await?;
        actualizar_en(&mut tx, gestion_id, &datos).await?;
        tx.commit().await?;

        info!(gestion_id, "✏️ Gestión actualizada");
        self.obtener_gestion_por_id(gestion_id).await
    }

    /// Borra la gestión con sus pagos, notas pendientes y vínculos a
    /// documentos. Si algún pago tiene una nota ya pasada no se borra nada.
    pub async fn eliminar_gestion(&self, gestion_id: i64) -> GestionesResult<()> {
        let mut tx = self.db.begin().await?;

        let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM gestiones WHERE id = ?")
            .bind(gestion_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existe.is_none() {
            return Err(GestionesError::GestionNoEncontrada(gestion_id));
        }

        let pasadas: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notas n JOIN pagos p ON p.id = n.pago_id
             WHERE p.gestion_id = ? AND n.factura_id IS NOT NULL",
        )
        .bind(gestion_id)
        .fetch_one(&mut *tx)
        .await?;
        if pasadas > 0 {
            warn!(gestion_id, pasadas, "🚫 Borrado de gestión rechazado por notas pasadas");
            return Err(GestionesError::GestionConNotasPasadas {
                gestion_id,
                cantidad: pasadas,
            });
        }

        sqlx::query("DELETE FROM notas WHERE pago_id IN (SELECT id FROM pagos WHERE gestion_id = ?)")
            .bind(gestion_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pagos WHERE gestion_id = ?")
            .bind(gestion_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM gestion_documento WHERE gestion_id = ?")
            .bind(gestion_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM gestiones WHERE id = ?")
            .bind(gestion_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(gestion_id, "🗑️ Gestión eliminada");
        Ok(())
    }
}

/// Normaliza y valida los datos de una gestión.
pub(super) fn preparar(datos: DatosGestion) -> GestionesResult<DatosGestion> {
    let datos = datos.normalizar();
    datos
        .validate()
        .map_err(|errores| GestionesError::ValidacionLote(mensajes_validacion(&errores)))?;
    Ok(datos)
}

pub(super) async fn insertar_gestion(conn: &mut SqliteConnection, datos: &DatosGestion) -> GestionesResult<i64> {
    let fecha = fecha_requerida(datos)?;
    let terminado = datos.terminado.unwrap_or(false);
    let fechaterminado = fecha_terminado(terminado, datos.fechaterminado, None);

    let gestion_id = sqlx::query(
        "INSERT INTO gestiones (
            ngestion, fecha, cliente, dominio, poliza, tipo, motivo, ncaso,
            usuariocarga, usuariorespuesta, estado, itr, totalfactura,
            terminado, fechaterminado, obs, activa
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(datos.ngestion)
    .bind(fecha)
    .bind(&datos.cliente)
    .bind(&datos.dominio)
    .bind(&datos.poliza)
    .bind(&datos.tipo)
    .bind(&datos.motivo)
    .bind(datos.ncaso)
    .bind(&datos.usuariocarga)
    .bind(&datos.usuariorespuesta)
    .bind(&datos.estado)
    .bind(datos.itr)
    .bind(datos.totalfactura)
    .bind(terminado)
    .bind(fechaterminado)
    .bind(&datos.obs)
    .bind(datos.activa.unwrap_or(true))
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(gestion_id)
}

pub(super) async fn actualizar_en(
    conn: &mut SqliteConnection,
    gestion_id: i64,
    datos: &DatosGestion,
) -> GestionesResult<()> {
    let fecha = fecha_requerida(datos)?;

    let guardado: Option<(bool, Option<NaiveDate>, bool)> = sqlx::query_as(
        "SELECT terminado, fechaterminado, activa FROM gestiones WHERE id = ?",
    )
    .bind(gestion_id)
    .fetch_optional(&mut *conn)
    .await?;
    let (terminado_previo, fechaterminado_previa, activa_previa) =
        guardado.ok_or(GestionesError::GestionNoEncontrada(gestion_id))?;

    let terminado = datos.terminado.unwrap_or(terminado_previo);
    let activa = datos.activa.unwrap_or(activa_previa);
    let fechaterminado = fecha_terminado(
        terminado,
        datos.fechaterminado,
        fechaterminado_previa,
    );

    sqlx::query(
        "UPDATE gestiones SET
            ngestion = ?, fecha = ?, cliente = ?, dominio = ?, poliza = ?, tipo = ?,
            motivo = ?, ncaso = ?, usuariocarga = ?, usuariorespuesta = ?, estado = ?,
            itr = ?, totalfactura = ?, terminado = ?, fechaterminado = ?, obs = ?, activa = ?
         WHERE id = ?",
    )
    .bind(datos.ngestion)
    .bind(fecha)
    .bind(&datos.cliente)
    .bind(&datos.dominio)
    .bind(&datos.poliza)
    .bind(&datos.tipo)
    .bind(&datos.motivo)
    .bind(datos.ncaso)
    .bind(&datos.usuariocarga)
    .bind(&datos.usuariorespuesta)
    .bind(&datos.estado)
    .bind(datos.itr)
    .bind(datos.totalfactura)
    .bind(terminado)
    .bind(fechaterminado)
    .bind(&datos.obs)
    .bind(activa)
    .bind(gestion_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn fecha_requerida(datos: &DatosGestion) -> GestionesResult<NaiveDate> {
    datos
        .fecha
        .ok_or_else(|| GestionesError::validacion("La fecha es obligatoria"))
}

/// Fecha de terminación a guardar: la indicada, la ya guardada o hoy si la
/// gestión está terminada; ninguna si no lo está.
fn fecha_terminado(
    terminado: bool,
    indicada: Option<NaiveDate>,
    guardada: Option<NaiveDate>,
) -> Option<NaiveDate> {
    if terminado {
        Some(
            indicada
                .or(guardada)
                .unwrap_or_else(|| Local::now().date_naive()),
        )
    } else {
        None
    }
}
