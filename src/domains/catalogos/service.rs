use sqlx::{Executor, Sqlite, SqlitePool};

use crate::domains::error::GestionesResult;

/// Tipos ofrecidos cuando todavía no hay gestiones cargadas.
pub const TIPOS_POR_DEFECTO: [&str; 3] = ["Especial", "Normal", "Urgente"];

/// Estados ofrecidos cuando ninguna gestión tiene estado.
pub const ESTADOS_POR_DEFECTO: [&str; 3] = ["Pendiente", "En Proceso", "Finalizado"];

/// Servicio de consulta de catálogos (agentes, formas de pago, tipos y estados)
pub struct CatalogoService {
    db: SqlitePool,
}

impl CatalogoService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn obtener_agentes(&self) -> GestionesResult<Vec<String>> {
        let agentes = sqlx::query_scalar("SELECT agente FROM agentes ORDER BY agente")
            .fetch_all(&self.db)
            .await?;
        Ok(agentes)
    }

    pub async fn obtener_formaspago(&self) -> GestionesResult<Vec<String>> {
        let formas = sqlx::query_scalar("SELECT formapago FROM formaspago ORDER BY formapago")
            .fetch_all(&self.db)
            .await?;
        Ok(formas)
    }

    pub async fn obtener_tipos(&self) -> GestionesResult<Vec<String>> {
        let tipos: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT tipo FROM gestiones WHERE tipo <> '' ORDER BY tipo",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(con_defecto(tipos, &TIPOS_POR_DEFECTO))
    }

    pub async fn obtener_estados(&self) -> GestionesResult<Vec<String>> {
        let estados: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT estado FROM gestiones
             WHERE estado IS NOT NULL AND estado <> ''
             ORDER BY estado",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(con_defecto(estados, &ESTADOS_POR_DEFECTO))
    }
}

pub async fn agente_id_por_nombre<'e, E>(executor: E, nombre: &str) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT id FROM agentes WHERE agente = ?")
        .bind(nombre)
        .fetch_optional(executor)
        .await
}

pub async fn formapago_id_por_nombre<'e, E>(
    executor: E,
    nombre: &str,
) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT id FROM formaspago WHERE formapago = ?")
        .bind(nombre)
        .fetch_optional(executor)
        .await
}

fn con_defecto(valores: Vec<String>, defecto: &[&str]) -> Vec<String> {
    if valores.is_empty() {
        defecto.iter().map(|v| v.to_string()).collect()
    } else {
        valores
    }
}
