use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::database::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::migrations::Migrator;

pub type DbConn = DatabaseConnection;

/// Open the pool shared by every component and bring the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn> {
    let pool_size = if config.is_in_memory() {
        1
    } else {
        config.max_connections.max(1)
    };
    tracing::info!(backend = config.backend(), pool_size, "Connecting to database");

    let mut opts = ConnectOptions::new(config.database_url.as_str());
    opts.max_connections(pool_size)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    if config.is_in_memory() {
        // Dropping the last connection drops the database.
        opts.idle_timeout(Duration::from_secs(u32::MAX as u64));
    }

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::Internal(format!("Database connection failed: {}", e)))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Schema migration failed: {}", e)))?;
    tracing::info!("Schema is up to date");

    Ok(db)
}
