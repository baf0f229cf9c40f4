use portal_core::{Alias, DirectoryError};
use std::fmt::Display;
use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while opening or preparing a store.
///
/// These belong to bootstrap, not to the directory contract, so they keep the
/// native `sqlx` detail.
#[derive(Debug, Error)]
pub enum StoreInitError {
    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Engines the store can run on; decides which native codes are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    fn is_transient_code(self, code: &str) -> bool {
        match self {
            // class 08: connection exception, 53300: too_many_connections,
            // 57P01..57P03: admin/crash shutdown, cannot_connect_now
            Backend::Postgres => {
                code.starts_with("08")
                    || code == "53300"
                    || matches!(code, "57P01" | "57P02" | "57P03")
            }
            // SQLITE_BUSY and SQLITE_LOCKED, including their extended codes
            Backend::Sqlite => code
                .parse::<i32>()
                .is_ok_and(|code| matches!(code & 0xff, 5 | 6)),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Postgres => f.write_str("postgres"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Translates an error from a statement that writes `alias`.
///
/// A unique-constraint violation means another record already owns `alias`.
pub(crate) fn map_write_error(
    err: sqlx::Error,
    backend: Backend,
    operation: &'static str,
    alias: &Alias,
) -> DirectoryError {
    if is_unique_violation(&err) {
        return DirectoryError::AliasExists(alias.to_string());
    }
    map_sqlx_error(err, backend, operation)
}

/// Translates any other `sqlx` error into the shared vocabulary, logging the
/// native detail since it never leaves the store.
pub(crate) fn map_sqlx_error(
    err: sqlx::Error,
    backend: Backend,
    operation: &'static str,
) -> DirectoryError {
    let transient = match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| backend.is_transient_code(&code)),
        _ => false,
    };

    if transient {
        warn!(%backend, operation, error = %err, "storage backend unavailable");
        DirectoryError::StoreUnavailable
    } else {
        error!(%backend, operation, error = %err, "storage operation failed");
        DirectoryError::Internal
    }
}
