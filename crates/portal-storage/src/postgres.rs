use crate::error::{map_sqlx_error, map_write_error, Backend, StoreInitError};
use crate::pool::PoolSettings;
use async_trait::async_trait;
use portal_core::{Alias, DirectoryError, DirectoryStore, RecordId, Result};
use sqlx::migrate::Migrator;
use sqlx::{PgPool, Postgres};
use tracing::debug;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");

/// PostgreSQL implementation of the directory store contract.
///
/// Every operation is a single statement run directly on the pool, so a
/// connection is held for exactly one round trip. Alias uniqueness comes from
/// the `UNIQUE` constraint on `url.alias` (SQLSTATE 23505 on violation).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing PostgreSQL connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new, bounded connection pool.
    pub async fn connect(
        database_url: &str,
        settings: &PoolSettings,
    ) -> std::result::Result<Self, StoreInitError> {
        let pool = settings
            .options::<Postgres>()
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> std::result::Result<(), StoreInitError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    async fn create(&self, url: &str, alias: &Alias) -> Result<RecordId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO url (alias, url)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(alias.as_str())
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_write_error(err, Backend::Postgres, "create", alias))?;

        debug!(%alias, id, "inserted alias");
        Ok(RecordId(id))
    }

    async fn lookup(&self, alias: &Alias) -> Result<String> {
        let url: Option<String> = sqlx::query_scalar(
            r#"
            SELECT url
            FROM url
            WHERE alias = $1
            "#,
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, Backend::Postgres, "lookup"))?;

        url.ok_or_else(|| DirectoryError::UrlNotFound(alias.to_string()))
    }

    async fn update(&self, current: &Alias, new: &Alias) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE url
            SET alias = $1
            WHERE alias = $2
            "#,
        )
        .bind(new.as_str())
        .bind(current.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, Backend::Postgres, "update", new))?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::AliasNotFound(current.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, alias: &Alias) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM url
            WHERE alias = $1
            "#,
        )
        .bind(alias.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, Backend::Postgres, "delete"))?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::AliasNotFound(alias.to_string()));
        }
        Ok(())
    }
}
