use crate::alias::Alias;
use crate::error::Result;
use crate::store::RecordId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for creating an alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateParams {
    /// The target URL, stored exactly as given.
    pub url: String,
    /// Caller-chosen alias. `None` or an empty string asks for a generated one.
    pub alias: Option<String>,
}

impl CreateParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: RecordId,
    pub alias: Alias,
}

/// The four operations of the alias directory.
///
/// Inputs arrive as raw strings from the transport; implementations validate
/// them and answer with the shared [`DirectoryError`] vocabulary.
///
/// [`DirectoryError`]: crate::error::DirectoryError
#[async_trait]
pub trait AliasDirectory: Send + Sync + 'static {
    /// Stores a new alias for a URL and returns the final alias and record id.
    async fn create(&self, params: CreateParams) -> Result<Created>;

    /// Resolves an alias to its URL.
    async fn lookup(&self, alias: &str) -> Result<String>;

    /// Renames an alias. `new_alias` may be empty, in which case the
    /// implementation's empty-rename policy applies.
    async fn update(&self, current: &str, new_alias: Option<&str>) -> Result<Alias>;

    /// Deletes an alias.
    async fn delete(&self, alias: &str) -> Result<()>;
}
