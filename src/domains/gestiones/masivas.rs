//! Carga masiva de gestiones

use chrono::NaiveDate;
use tracing::{info, warn};

use super::models::{DatosGestion, GestionesMasivas, ResultadoMasivo};
use super::service::{actualizar_en, insertar_gestion, preparar, GestionService};
use crate::domains::error::{GestionesError, GestionesResult};
use crate::domains::pagos::nota_credito::{AGENTE_PRESTADOR, AGENTE_SOS, FORMA_TRANSFERENCIA};
use crate::domains::pagos::service::insertar_pago;

struct Guardada {
    id: i64,
    fecha: NaiveDate,
    totalfactura: f64,
}

impl GestionService {
    /// Crea o actualiza un lote de gestiones.
    ///
    /// Todas las filas se validan antes de escribir; si alguna falla no se
    /// guarda ninguna. Superada la validación, cada fila se guarda por separado
    /// y sus errores se informan en `fallos` sin cortar el lote. Opcionalmente
    /// genera un pago SOS → PRESTADOR por transferencia por el total facturado
    /// y vincula los documentos indicados a cada gestión guardada.
    pub async fn guardar_gestiones_masivas(&self, lote: GestionesMasivas) -> GestionesResult<ResultadoMasivo> {
        if lote.gestiones.is_empty() {
            return Err(GestionesError::validacion("No hay gestiones para guardar"));
        }

        let mut errores = Vec::new();
        let mut filas = Vec::with_capacity(lote.gestiones.len());
        for (idx, fila) in lote.gestiones.into_iter().enumerate() {
            let numero = idx + 1;
            let mut datos = fila.datos;
            // Las gestiones masivas no llevan número de gestión
            datos.ngestion = 0;

            if lote.generar_pagos && !(datos.totalfactura > 0.0) {
                errores.push(format!(
                    "Gestión #{}: Total factura debe ser mayor a 0 para generar pagos",
                    numero
                ));
            }

            match preparar(datos) {
                Ok(datos) => match datos.fecha {
                    Some(fecha) => filas.push((numero, fila.id, fecha, datos)),
                    None => errores.push(format!("Gestión #{}: La fecha es obligatoria", numero)),
                },
                Err(GestionesError::ValidacionLote(mensajes)) => {
                    errores.extend(mensajes.into_iter().map(|m| format!("Gestión #{}: {}", numero, m)));
                }
                Err(otro) => errores.push(format!("Gestión #{}: {}", numero, otro)),
            }
        }

        for documento_id in &lote.documento_ids {
            let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM documentos WHERE id = ?")
                .bind(documento_id)
                .fetch_optional(&self.db)
                .await?;
            if existe.is_none() {
                errores.push(format!("Documento {} no encontrado", documento_id));
            }
        }

        if !errores.is_empty() {
            warn!(errores = errores.len(), "🚫 Carga masiva rechazada por validación");
            return Err(GestionesError::ValidacionLote(errores));
        }

        let mut resultado = ResultadoMasivo::default();
        let mut guardadas = Vec::new();

        for (numero, id, fecha, datos) in filas {
            match self.guardar_fila(id, &datos).await {
                Ok(gestion_id) => {
                    match id {
                        Some(_) => resultado.actualizadas.push(gestion_id),
                        None => resultado.creadas.push(gestion_id),
                    }
                    guardadas.push(Guardada {
                        id: gestion_id,
                        fecha,
                        totalfactura: datos.totalfactura,
                    });
                }
                Err(e) => resultado.fallos.push(format!("Gestión #{}: {}", numero, e)),
            }
        }

        if lote.generar_pagos {
            for gestion in &guardadas {
                match self.generar_pago(gestion).await {
                    Ok(()) => resultado.pagos_creados += 1,
                    Err(e) => resultado
                        .fallos
                        .push(format!("Pago para gestión {}: {}", gestion.id, e)),
                }
            }
        }

        for &documento_id in &lote.documento_ids {
            for gestion in &guardadas {
                match self.vincular_documento(gestion.id, documento_id).await {
                    Ok(vinculado) => resultado.documentos_asociados += vinculado as usize,
                    Err(e) => resultado.fallos.push(format!(
                        "Documento {} en gestión {}: {}",
                        documento_id, gestion.id, e
                    )),
                }
            }
        }

        info!(
            creadas = resultado.creadas.len(),
            actualizadas = resultado.actualizadas.len(),
            pagos = resultado.pagos_creados,
            fallos = resultado.fallos.len(),
            "📦 Carga masiva de gestiones procesada"
        );

        Ok(resultado)
    }

    async fn guardar_fila(&self, id: Option<i64>, datos: &DatosGestion) -> GestionesResult<i64> {
        match id {
            Some(gestion_id) => {
                let mut tx = self.db.begin().await?;
                actualizar_en(&mut tx, gestion_id, datos).await?;
                tx.commit().await?;
                Ok(gestion_id)
            }
            None => {
                let mut conn = self.db.acquire().await?;
                insertar_gestion(&mut conn, datos).await
            }
        }
    }

    async fn generar_pago(&self, gestion: &Guardada) -> GestionesResult<()> {
        let mut tx = self.db.begin().await?;
        insertar_pago(
            &mut tx,
            gestion.id,
            gestion.fecha,
            AGENTE_SOS,
            AGENTE_PRESTADOR,
            FORMA_TRANSFERENCIA,
            gestion.totalfactura,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn vincular_documento(&self, gestion_id: i64, documento_id: i64) -> GestionesResult<bool> {
        let vinculo = sqlx::query(
            "INSERT OR IGNORE INTO gestion_documento (gestion_id, documento_id) VALUES (?, ?)",
        )
        .bind(gestion_id)
        .bind(documento_id)
        .execute(&self.db)
        .await?;
        Ok(vinculo.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use crate::domains::gestiones::models::FilaMasiva;
    use shared::DatabaseService;

    async fn service() -> GestionService {
        let db = DatabaseService::in_memory().await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        GestionService::new(db.pool().clone())
    }

    fn fila(poliza: &str, total: f64) -> FilaMasiva {
        FilaMasiva {
            id: None,
            datos: DatosGestion {
                ngestion: 77,
                fecha: NaiveDate::from_ymd_opt(2024, 4, 1),
                poliza: poliza.to_string(),
                tipo: "Normal".to_string(),
                dominio: "aa 111 bb".to_string(),
                totalfactura: total,
                ..Default::default()
            },
        }
    }

    async fn documento(svc: &GestionService) -> i64 {
        sqlx::query(
            "INSERT INTO documentos (titulo, nombre_archivo, mime_type, tamano, hash, ruta)
             VALUES ('Factura', 'f.pdf', 'application/pdf', 10, 'abc', 'files/docs/abc.pdf')",
        )
        .execute(&svc.db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn crea_gestiones_pagos_y_vinculos() {
        let svc = service().await;
        let doc_id = documento(&svc).await;

        let lote = GestionesMasivas {
            gestiones: vec![fila("P-1", 1000.0), fila("P-2", 250.5)],
            generar_pagos: true,
            documento_ids: vec![doc_id],
        };
        let resultado = svc.guardar_gestiones_masivas(lote).await.unwrap();

        assert_eq!(resultado.creadas.len(), 2);
        assert_eq!(resultado.pagos_creados, 2);
        assert_eq!(resultado.documentos_asociados, 2);
        assert!(resultado.fallos.is_empty());

        let gestion = svc.obtener_gestion_por_id(resultado.creadas[0]).await.unwrap();
        assert_eq!(gestion.ngestion, 0);
        assert_eq!(gestion.dominio, "AA111BB");

        let (pagador, destinatario, formapago, importe): (String, String, String, f64) = sqlx::query_as(
            "SELECT ap.agente, ad.agente, fp.formapago, p.importe FROM pagos p
             JOIN agentes ap ON ap.id = p.pagador_id
             JOIN agentes ad ON ad.id = p.destinatario_id
             JOIN formaspago fp ON fp.id = p.formapago_id
             WHERE p.gestion_id = ?",
        )
        .bind(resultado.creadas[1])
        .fetch_one(&svc.db)
        .await
        .unwrap();
        assert_eq!(pagador, "SOS");
        assert_eq!(destinatario, "PRESTADOR");
        assert_eq!(formapago, "TRANSFERENCIA");
        assert_eq!(importe, 250.5);
    }

    #[tokio::test]
    async fn validacion_rechaza_todo_el_lote() {
        let svc = service().await;
        let mut sin_poliza = fila("", 100.0);
        sin_poliza.datos.tipo = String::new();

        let lote = GestionesMasivas {
            gestiones: vec![fila("P-1", 0.0), sin_poliza],
            generar_pagos: true,
            documento_ids: vec![404],
        };
        let err = svc.guardar_gestiones_masivas(lote).await.unwrap_err();
        let GestionesError::ValidacionLote(errores) = err else {
            panic!("se esperaba un error de validación");
        };
        assert!(errores.iter().any(|e| e.starts_with("Gestión #1: Total factura")));
        assert!(errores.iter().any(|e| e.starts_with("Gestión #2:") && e.contains("póliza")));
        assert!(errores.iter().any(|e| e == "Documento 404 no encontrado"));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gestiones")
            .fetch_one(&svc.db)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn filas_con_id_se_actualizan_y_los_fallos_no_cortan_el_lote() {
        let svc = service().await;
        let existente = svc.crear_gestion(fila("P-1", 0.0).datos).await.unwrap();

        let mut edicion = fila("P-1-EDIT", 0.0);
        edicion.id = Some(existente.id);
        let mut inexistente = fila("P-X", 0.0);
        inexistente.id = Some(999);

        let lote = GestionesMasivas {
            gestiones: vec![edicion, inexistente, fila("P-3", 0.0)],
            ..Default::default()
        };
        let resultado = svc.guardar_gestiones_masivas(lote).await.unwrap();

        assert_eq!(resultado.actualizadas, vec![existente.id]);
        assert_eq!(resultado.creadas.len(), 1);
        assert_eq!(resultado.fallos.len(), 1);
        assert!(resultado.fallos[0].starts_with("Gestión #2:"));

        let editada = svc.obtener_gestion_por_id(existente.id).await.unwrap();
        assert_eq!(editada.poliza, "P-1-EDIT");
    }

    #[tokio::test]
    async fn fallos_de_pagos_y_vinculos_no_cortan_el_lote() {
        let svc = service().await;
        let doc_id = documento(&svc).await;
        sqlx::raw_sql(
            "CREATE TRIGGER sin_pago_p2 BEFORE INSERT ON pagos
             WHEN (SELECT poliza FROM gestiones WHERE id = NEW.gestion_id) = 'P-2'
             BEGIN SELECT RAISE(ABORT, 'pago bloqueado'); END;
             CREATE TRIGGER sin_vinculo_p3 BEFORE INSERT ON gestion_documento
             WHEN (SELECT poliza FROM gestiones WHERE id = NEW.gestion_id) = 'P-3'
             BEGIN SELECT RAISE(ABORT, 'vinculo bloqueado'); END;",
        )
        .execute(&svc.db)
        .await
        .unwrap();

        let lote = GestionesMasivas {
            gestiones: vec![fila("P-1", 10.0), fila("P-2", 20.0), fila("P-3", 30.0)],
            generar_pagos: true,
            documento_ids: vec![doc_id],
        };
        let resultado = svc.guardar_gestiones_masivas(lote).await.unwrap();

        assert_eq!(resultado.creadas.len(), 3);
        assert_eq!(resultado.pagos_creados, 2);
        assert_eq!(resultado.documentos_asociados, 2);
        assert_eq!(resultado.fallos.len(), 2);
        assert!(resultado.fallos[0].starts_with(&format!("Pago para gestión {}", resultado.creadas[1])));
        assert!(resultado.fallos[1].starts_with(&format!("Documento {} en gestión {}", doc_id, resultado.creadas[2])));
    }
}
