//! Database connection management

use civitas_core::{DatabaseConfig, ServiceError, ServiceResult};
use civitas_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::{debug, info};

pub type DbConnection = DatabaseConnection;

/// Open a connection pool without touching the schema
pub async fn connect(config: &DatabaseConfig) -> ServiceResult<DbConnection> {
    config.validate()?;

    let mut opt = ConnectOptions::new(config.url.clone());
    if config.is_in_memory() {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections);
    }
    opt.sqlx_logging(false);

    debug!(
        "Connecting to database (max_connections: {}, in_memory: {})",
        config.max_connections,
        config.is_in_memory()
    );

    Database::connect(opt)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))
}

/// Apply pending migrations, returning how many ran
pub async fn run_migrations(db: &DbConnection) -> ServiceResult<usize> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?
        .len();

    Migrator::up(db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    if pending > 0 {
        info!("Applied {} database migration(s)", pending);
    }
    Ok(pending)
}

pub async fn establish_connection(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    let db = connect(config).await?;
    run_migrations(&db).await?;
    Ok(Arc::new(db))
}
