use crate::alias::Alias;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Backend-assigned surrogate key of a record. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent alias → URL records.
///
/// Every backend enforces alias uniqueness with a unique constraint and
/// reports violations as [`DirectoryError::AliasExists`]. Implementations must
/// not pre-check for existence before writing; the constraint is the only
/// arbiter between concurrent writers.
///
/// [`DirectoryError::AliasExists`]: crate::error::DirectoryError::AliasExists
#[async_trait]
pub trait DirectoryStore: Send + Sync + 'static {
    /// Inserts a new record. Returns `Err(AliasExists)` if the alias is taken.
    async fn create(&self, url: &str, alias: &Alias) -> Result<RecordId>;

    /// Returns the URL stored under `alias`, or `Err(UrlNotFound)`.
    async fn lookup(&self, alias: &Alias) -> Result<String>;

    /// Renames `current` to `new` in a single atomic statement.
    ///
    /// Returns `Err(AliasNotFound)` if `current` has no record and
    /// `Err(AliasExists)` if `new` belongs to another record.
    async fn update(&self, current: &Alias, new: &Alias) -> Result<()>;

    /// Removes the record for `alias`. Returns `Err(AliasNotFound)` if no row
    /// was affected, so a repeated delete fails.
    async fn delete(&self, alias: &Alias) -> Result<()>;
}
