use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Handle to the on-device store. Opened once per background context and passed down
/// to everything that touches the queue.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    /// Opens or creates the store and applies pending migrations. Every failure maps to
    /// `StorageUnavailable`, which disables queueing for the session.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|err| AppError::StorageUnavailable(err.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.busy_timeout));

        let filename = options.get_filename();
        if filename.as_os_str() != ":memory:"
            && let Some(parent) = filename.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::StorageUnavailable(format!(
                    "cannot create data directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await
            .map_err(|err| AppError::StorageUnavailable(err.to_string()))?;

        let handle = Self {
            pool: Arc::new(pool),
        };
        handle.migrate().await?;

        tracing::info!(
            target: "offline::store",
            url = %config.url,
            "offline store opened"
        );
        Ok(handle)
    }

    /// Single-connection in-memory store; the database lives as long as that connection.
    pub async fn from_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|err| AppError::StorageUnavailable(err.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|err| AppError::StorageUnavailable(err.to_string()))?;

        let handle = Self {
            pool: Arc::new(pool),
        };
        handle.migrate().await?;
        Ok(handle)
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(AppError::from)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
