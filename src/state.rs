use shared::{Config, DatabaseService};
use sqlx::SqlitePool;
use std::time::Instant;

use crate::db::run_migrations;
use crate::domains::catalogos::CatalogoService;
use crate::domains::documentos::{AlmacenDocumentos, DocumentoService};
use crate::domains::gestiones::GestionService;
use crate::domains::pagos::PagoService;
use crate::domains::periodos::PeriodoService;

/// Estado compartido de la aplicación.
/// Contiene el pool de SQLite, la configuración y el almacén de documentos.
#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseService,
    pub db_pool: SqlitePool,
    pub config: Config,
    pub almacen: AlmacenDocumentos,
    pub started_at: Instant,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = DatabaseService::new(&config.database).await?;

        run_migrations(database.pool())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply schema: {}", e))?;
        tracing::info!("✅ Schema applied and catalogs seeded");

        Ok(Self::from_database(database, config))
    }

    /// Estado sobre una base ya migrada.
    pub fn from_database(database: DatabaseService, config: Config) -> Self {
        let almacen = AlmacenDocumentos::new(&config.storage.docs_dir);
        Self {
            db_pool: database.pool().clone(),
            database,
            config,
            almacen,
            started_at: Instant::now(),
        }
    }

    pub fn catalogos(&self) -> CatalogoService {
        CatalogoService::new(self.db_pool.clone())
    }

    pub fn gestiones(&self) -> GestionService {
        GestionService::new(self.db_pool.clone())
    }

    pub fn pagos(&self) -> PagoService {
        PagoService::new(self.db_pool.clone())
    }

    pub fn periodos(&self) -> PeriodoService {
        PeriodoService::new(self.db_pool.clone())
    }

    pub fn documentos(&self) -> DocumentoService {
        DocumentoService::new(self.db_pool.clone(), self.almacen.clone())
    }
}
