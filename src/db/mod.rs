pub mod schema;

use sqlx::SqlitePool;
use tracing::info;

use crate::domains::pagos::nota_credito::{
    AGENTE_PRESTADOR, AGENTE_SM, AGENTE_SOS, FORMA_NOTA_CREDITO, FORMA_TRANSFERENCIA,
};

/// Agentes que el sistema necesita para las reglas de notas de crédito y pagos masivos.
pub const AGENTES_BASE: [&str; 3] = [AGENTE_SOS, AGENTE_SM, AGENTE_PRESTADOR];

pub const FORMASPAGO_BASE: [&str; 4] = [FORMA_NOTA_CREDITO, FORMA_TRANSFERENCIA, "EFECTIVO", "CHEQUE"];

/// Crea las tablas si faltan y carga los catálogos fijos.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(schema::CREATE_TABLES).execute(pool).await?;
    seed_catalogos(pool).await?;
    info!("🗄️ Database schema ready");
    Ok(())
}

async fn seed_catalogos(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for agente in AGENTES_BASE {
        sqlx::query("INSERT OR IGNORE INTO agentes (agente) VALUES (?)")
            .bind(agente)
            .execute(&mut *tx)
            .await?;
    }

    for formapago in FORMASPAGO_BASE {
        sqlx::query("INSERT OR IGNORE INTO formaspago (formapago) VALUES (?)")
            .bind(formapago)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}
