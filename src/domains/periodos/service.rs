use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::models::{
    validar_importe_factura, validar_periodo, DatosFactura, Factura, FacturaDetalle,
    FacturaResumen, NotaDetalle,
};
use crate::domains::error::{GestionesError, GestionesResult};
use crate::domains::pagos::models::parsear_fecha;

const SELECT_NOTA_DETALLE: &str = "SELECT
        n.id,
        n.pago_id,
        n.factura_id,
        g.id AS gestion_id,
        p.fecha,
        p.importe,
        g.ngestion,
        g.dominio,
        g.poliza,
        g.cliente,
        g.tipo
    FROM notas n
    JOIN pagos p ON p.id = n.pago_id
    JOIN gestiones g ON g.id = p.gestion_id";

/// Servicio de facturas (períodos) y de la asignación de notas de crédito
pub struct PeriodoService {
    db: SqlitePool,
}

impl PeriodoService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn obtener_facturas(&self) -> GestionesResult<Vec<FacturaResumen>> {
        let facturas = sqlx::query_as::<_, FacturaResumen>(
            "SELECT
                f.id, f.nrofactura, f.fechaemitida, f.periodo, f.importe,
                COUNT(n.id) AS cantnotas,
                COALESCE(SUM(p.importe), 0.0) AS importenotas
             FROM facturas f
             LEFT JOIN notas n ON n.factura_id = f.id
             LEFT JOIN pagos p ON p.id = n.pago_id
             GROUP BY f.id, f.nrofactura, f.fechaemitida, f.periodo, f.importe
             ORDER BY f.periodo DESC, f.id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(facturas)
    }

    pub async fn obtener_factura_por_id(&self, factura_id: i64) -> GestionesResult<Factura> {
        sqlx::query_as::<_, Factura>(
            "SELECT id, nrofactura, fechaemitida, periodo, importe FROM facturas WHERE id = ?",
        )
        .bind(factura_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(GestionesError::FacturaNoEncontrada(factura_id))
    }

    pub async fn obtener_detalle_factura(&self, factura_id: i64) -> GestionesResult<FacturaDetalle> {
        let factura = self.obtener_factura_por_id(factura_id).await?;
        let notas = self.obtener_notas_de_factura(factura_id).await?;
        Ok(FacturaDetalle { factura, notas })
    }

    pub async fn obtener_notas_sin_factura(&self) -> GestionesResult<Vec<NotaDetalle>> {
        let notas = sqlx::query_as::<_, NotaDetalle>(&format!(
            "{} WHERE n.factura_id IS NULL ORDER BY p.fecha DESC, n.id DESC",
            SELECT_NOTA_DETALLE
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(notas)
    }

    pub async fn obtener_notas_de_factura(&self, factura_id: i64) -> GestionesResult<Vec<NotaDetalle>> {
        let notas = sqlx::query_as::<_, NotaDetalle>(&format!(
            "{} WHERE n.factura_id = ? ORDER BY p.fecha DESC, n.id DESC",
            SELECT_NOTA_DETALLE
        ))
        .bind(factura_id)
        .fetch_all(&self.db)
        .await?;
        Ok(notas)
    }

    pub async fn crear_factura(&self, datos: &DatosFactura) -> GestionesResult<Factura> {
        let importe = datos.importe.unwrap_or(0.0);
        let factura_id = {
            let mut conn = self.db.acquire().await?;
            insertar_factura(&mut conn, datos, importe).await?
        };

        info!(factura_id, periodo = datos.periodo, "🧾 Factura creada");
        self.obtener_factura_por_id(factura_id).await
    }

    /// Crea la factura y le asigna las notas en una sola transacción.
    pub async fn crear_factura_con_notas(&self, datos: &DatosFactura) -> GestionesResult<FacturaDetalle> {
        let nota_ids = sin_repetidas(&datos.nota_ids)?;
        let mut tx = self.db.begin().await?;

        let importe = match datos.importe {
            Some(importe) => importe,
            None => importe_de_notas(&mut tx, &nota_ids).await?,
        };
        let factura_id = insertar_factura(&mut tx, datos, importe).await?;
        asignar_en(&mut tx, &nota_ids, factura_id).await?;

        tx.commit().await?;

        info!(factura_id, notas = nota_ids.len(), "🧾 Factura creada con notas");
        self.obtener_detalle_factura(factura_id).await
    }

    pub async fn actualizar_factura(&self, factura_id: i64, datos: &DatosFactura) -> GestionesResult<Factura> {
        validar_periodo(datos.periodo)?;
        let fecha = parsear_fecha(&datos.fechaemitida)?;
        let actual = self.obtener_factura_por_id(factura_id).await?;
        let importe = datos.importe.unwrap_or(actual.importe);
        validar_importe_factura(importe)?;

        sqlx::query(
            "UPDATE facturas SET periodo = ?, fechaemitida = ?, importe = ?, nrofactura = ? WHERE id = ?",
        )
        .bind(datos.periodo)
        .bind(fecha)
        .bind(importe)
        .bind(datos.nrofactura.as_deref().or(actual.nrofactura.as_deref()))
        .bind(factura_id)
        .execute(&self.db)
        .await?;

        info!(factura_id, "✏️ Factura actualizada");
        self.obtener_factura_por_id(factura_id).await
    }

    /// Borra la factura. Sus notas vuelven a quedar sin pasar.
    pub async fn eliminar_factura(&self, factura_id: i64) -> GestionesResult<u64> {
        let mut tx = self.db.begin().await?;

        let liberadas = sqlx::query("UPDATE notas SET factura_id = NULL WHERE factura_id = ?")
            .bind(factura_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let borradas = sqlx::query("DELETE FROM facturas WHERE id = ?")
            .bind(factura_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if borradas == 0 {
            return Err(GestionesError::FacturaNoEncontrada(factura_id));
        }

        tx.commit().await?;

        info!(factura_id, liberadas, "🗑️ Factura eliminada");
        Ok(liberadas)
    }

    pub async fn asignar_notas_a_factura(&self, nota_ids: &[i64], factura_id: i64) -> GestionesResult<u64> {
        let nota_ids = sin_repetidas(nota_ids)?;
        let mut tx = self.db.begin().await?;

        let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM facturas WHERE id = ?")
            .bind(factura_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existe.is_none() {
            return Err(GestionesError::FacturaNoEncontrada(factura_id));
        }

        let asignadas = asignar_en(&mut tx, &nota_ids, factura_id).await?;
        tx.commit().await?;

        info!(factura_id, asignadas, "📎 Notas asignadas a factura");
        Ok(asignadas)
    }

    /// Quita la nota de su factura; la nota vuelve a estar pendiente.
    pub async fn desasociar_nota_de_factura(&self, nota_id: i64) -> GestionesResult<()> {
        let resultado = sqlx::query("UPDATE notas SET factura_id = NULL WHERE id = ?")
            .bind(nota_id)
            .execute(&self.db)
            .await?;
        if resultado.rows_affected() == 0 {
            return Err(GestionesError::NotaNoEncontrada(nota_id));
        }

        info!(nota_id, "📎 Nota desasociada de su factura");
        Ok(())
    }
}

async fn insertar_factura(
    conn: &mut SqliteConnection,
    datos: &DatosFactura,
    importe: f64,
) -> GestionesResult<i64> {
    validar_periodo(datos.periodo)?;
    let fecha = parsear_fecha(&datos.fechaemitida)?;
    validar_importe_factura(importe)?;

    let factura_id = sqlx::query(
        "INSERT INTO facturas (nrofactura, fechaemitida, periodo, importe) VALUES (?, ?, ?, ?)",
    )
    .bind(datos.nrofactura.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(fecha)
    .bind(datos.periodo)
    .bind(importe)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(factura_id)
}

/// Ordena los ids de notas y descarta repetidos; la lista no puede quedar vacía.
fn sin_repetidas(nota_ids: &[i64]) -> GestionesResult<Vec<i64>> {
    if nota_ids.is_empty() {
        return Err(GestionesError::validacion("Debe seleccionar al menos una nota"));
    }
    let mut ids = nota_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

async fn importe_de_notas(conn: &mut SqliteConnection, nota_ids: &[i64]) -> GestionesResult<f64> {
    let mut total = 0.0;
    for nota_id in nota_ids {
        let importe: Option<f64> = sqlx::query_scalar(
            "SELECT p.importe FROM notas n JOIN pagos p ON p.id = n.pago_id WHERE n.id = ?",
        )
        .bind(nota_id)
        .fetch_optional(&mut *conn)
        .await?;
        total += importe.ok_or(GestionesError::NotaNoEncontrada(*nota_id))?;
    }
    Ok(total)
}

/// Vincula las notas a la factura. Rechaza notas inexistentes o ya pasadas a
/// otra factura; reasignar a la misma factura no cambia nada.
async fn asignar_en(conn: &mut SqliteConnection, nota_ids: &[i64], factura_id: i64) -> GestionesResult<u64> {
    let mut asignadas = 0;
    for &nota_id in nota_ids {
        let actual: Option<(Option<i64>,)> = sqlx::query_as("SELECT factura_id FROM notas WHERE id = ?")
            .bind(nota_id)
            .fetch_optional(&mut *conn)
            .await?;

        match actual {
            None => return Err(GestionesError::NotaNoEncontrada(nota_id)),
            Some((Some(otra),)) if otra != factura_id => {
                warn!(nota_id, factura_id = otra, "🚫 Nota ya asignada a otra factura");
                return Err(GestionesError::NotaYaAsignada {
                    nota_id,
                    factura_id: otra,
                });
            }
            Some((Some(_),)) => {}
            Some((None,)) => {
                sqlx::query("UPDATE notas SET factura_id = ? WHERE id = ?")
                    .bind(factura_id)
                    .bind(nota_id)
                    .execute(&mut *conn)
                    .await?;
                asignadas += 1;
            }
        }
    }
    Ok(asignadas)
}
