use std::{cmp::max, time::Duration};

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

use migration::{Migrator, MigratorTrait};

use crate::config::DatabaseConfig;

pub async fn init(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url());
    options
        .min_connections(max(num_cpus::get() as u32, 2))
        .max_connections(max(num_cpus::get() as u32 * 4, 10))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true);

    if config.is_postgres() {
        options.set_schema_search_path(config.schema());
    }

    let db = Database::connect(options).await?;
    db.ping().await?;

    tracing::info!("Database connected successfully");

    log_db_version(&db).await?;

    Ok(db)
}

/// Single-connection in-memory SQLite with the schema applied. Every extra pooled
/// connection would see its own empty database, so the pool is pinned to one.
pub async fn in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .min_connections(1)
        .max_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

async fn log_db_version(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Sqlite => "SELECT sqlite_version()",
        _ => "SELECT version()",
    };

    let version = db
        .query_one(Statement::from_string(backend, sql.to_owned()))
        .await?
        .ok_or_else(|| anyhow::anyhow!("Could not retrieve database version"))?;

    let version_str: String = version.try_get_by_index::<String>(0)?;
    tracing::info!("Database version: {}", version_str);

    Ok(())
}
