use crate::error::{map_sqlx_error, map_write_error, Backend, StoreInitError};
use crate::pool::PoolSettings;
use async_trait::async_trait;
use portal_core::{Alias, DirectoryError, DirectoryStore, RecordId, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::debug;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");

/// Embedded SQLite implementation of the directory store contract.
///
/// Suited to standalone deployments and tests. `AUTOINCREMENT` keeps record
/// ids from being reused after a delete; the `UNIQUE` constraint on
/// `url.alias` reports collisions as `SQLITE_CONSTRAINT_UNIQUE`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a store from an existing SQLite connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database file named by `database_url`.
    pub async fn connect(
        database_url: &str,
        settings: &PoolSettings,
    ) -> std::result::Result<Self, StoreInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = settings
            .options::<Sqlite>()
            .connect_with(options)
            .await?;
        Ok(Self::from_pool(pool))
    }

    /// Opens a private in-memory database with the schema already applied.
    ///
    /// An in-memory database lives and dies with its connection, so the pool
    /// is pinned to a single connection that never expires.
    pub async fn in_memory() -> std::result::Result<Self, StoreInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> std::result::Result<(), StoreInitError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn create(&self, url: &str, alias: &Alias) -> Result<RecordId> {
        let result = sqlx::query(
            r#"
            INSERT INTO url (alias, url)
            VALUES (?, ?)
            "#,
        )
        .bind(alias.as_str())
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, Backend::Sqlite, "create", alias))?;

        let id = result.last_insert_rowid();
        debug!(%alias, id, "inserted alias");
        Ok(RecordId(id))
    }

    async fn lookup(&self, alias: &Alias) -> Result<String> {
        let url: Option<String> = sqlx::query_scalar(
            r#"
            SELECT url
            FROM url
            WHERE alias = ?
            "#,
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, Backend::Sqlite, "lookup"))?;

        url.ok_or_else(|| DirectoryError::UrlNotFound(alias.to_string()))
    }

    async fn update(&self, current: &Alias, new: &Alias) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE url
            SET alias = ?
            WHERE alias = ?
            "#,
        )
        .bind(new.as_str())
        .bind(current.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, Backend::Sqlite, "update", new))?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::AliasNotFound(current.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, alias: &Alias) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM url
            WHERE alias = ?
            "#,
        )
        .bind(alias.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, Backend::Sqlite, "delete"))?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::AliasNotFound(alias.to_string()));
        }
        Ok(())
    }
}
