//! Relational backends for the alias directory.
//!
//! Both backends implement [`portal_core::DirectoryStore`] on top of a bounded
//! `sqlx` pool and translate engine errors into the shared
//! [`portal_core::DirectoryError`] vocabulary before returning.

pub mod error;
pub mod pool;
pub mod postgres;
pub mod sqlite;

pub use error::StoreInitError;
pub use pool::PoolSettings;
pub use portal_core::{Alias, DirectoryError, DirectoryStore, RecordId};
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
