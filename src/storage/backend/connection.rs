//! Opening the pool and bringing the schema up to date.

use std::str::FromStr;
use std::time::Duration;

use sea_orm::sqlx::SqlitePool;
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{MajazamoozError, Result};
use migration::{Migrator, MigratorTrait};

/// Database engine, picked from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Mysql,
    Postgres,
}

impl Backend {
    /// Bare file names (`data.db`) count as SQLite.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split_once("://").map(|(s, _)| s).unwrap_or("");
        match scheme {
            "sqlite" => Ok(Self::Sqlite),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "" if url.starts_with("sqlite:")
                || url == ":memory:"
                || url.ends_with(".db")
                || url.ends_with(".sqlite") =>
            {
                Ok(Self::Sqlite)
            }
            _ => Err(MajazamoozError::database_config(format!(
                "Unsupported database URL '{}': expected sqlite://, mysql://, mariadb:// or postgres://",
                url
            ))),
        }
    }
}

pub(super) async fn open(config: &DatabaseConfig, backend: Backend) -> Result<DatabaseConnection> {
    match backend {
        Backend::Sqlite => open_sqlite(&config.database_url).await,
        Backend::Mysql | Backend::Postgres => open_pooled(config, backend).await,
    }
}

/// WAL journal, enforced foreign keys and a busy timeout so concurrent
/// likes wait instead of failing straight away.
async fn open_sqlite(url: &str) -> Result<DatabaseConnection> {
    let url = if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite://{}", url)
    };

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| MajazamoozError::database_config(format!("Bad SQLite URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePool::connect_with(options).await.map_err(|e| {
        MajazamoozError::database_connection(format!("SQLite open failed: {}", e))
    })?;
    debug!("SQLite pool opened at {}", url);

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

async fn open_pooled(config: &DatabaseConfig, backend: Backend) -> Result<DatabaseConnection> {
    let timeout = Duration::from_secs(config.timeout);

    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.pool_size)
        .min_connections(config.pool_size.min(2))
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(options).await.map_err(|e| {
        MajazamoozError::database_connection(format!("{} connection failed: {}", backend, e))
    })
}

pub(super) async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| MajazamoozError::database_operation(format!("Migration failed: {}", e)))?;
    info!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_backend_from_url() {
        assert_eq!(Backend::from_url("sqlite://data.db?mode=rwc").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("majazamooz.db").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("mariadb://u@h/db").unwrap(), Backend::Mysql);
        assert_eq!(Backend::from_url("postgresql://u@h/db").unwrap(), Backend::Postgres);
        assert!(Backend::from_url("redis://localhost").is_err());
    }

    #[test]
    fn backend_names_are_lowercase() {
        let name: &'static str = Backend::Postgres.into();
        assert_eq!(name, "postgres");
        assert_eq!(Backend::Mysql.to_string(), "mysql");
    }
}
