use crate::error::DirectoryError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An alias naming a stored URL mapping.
///
/// Aliases are case-sensitive. A *new* alias (one about to be written) must be
/// 1-64 characters and contain only alphanumeric characters, hyphens, or
/// underscores so it always fits a single URL path segment. An alias that only
/// *refers* to an existing record is merely required to be non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

pub const MAX_LENGTH: usize = 64;

impl Alias {
    /// Creates an alias that is about to be stored, validating its syntax.
    pub fn new(alias: impl Into<String>) -> Result<Self, DirectoryError> {
        let alias = alias.into();
        Self::validate(&alias)?;
        Ok(Self(alias))
    }

    /// Creates an alias used to look up an existing record.
    ///
    /// Only emptiness is rejected; anything else is passed to the store, which
    /// answers with a not-found outcome for aliases it never accepted.
    pub fn reference(alias: impl Into<String>) -> Result<Self, DirectoryError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(DirectoryError::invalid_input("alias must not be empty"));
        }
        Ok(Self(alias))
    }

    /// Creates an alias without validation.
    ///
    /// Use this only for aliases produced by trusted internal sources
    /// (e.g. the random generator, which only emits alphabet symbols).
    pub fn new_unchecked(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(alias: &str) -> Result<(), DirectoryError> {
        if alias.is_empty() {
            return Err(DirectoryError::invalid_input("alias must not be empty"));
        }

        if alias.len() > MAX_LENGTH {
            return Err(DirectoryError::InvalidInput(format!(
                "alias must be at most {} characters, got {}",
                MAX_LENGTH,
                alias.len()
            )));
        }

        if !alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DirectoryError::InvalidInput(format!(
                "alias must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                alias
            )));
        }

        Ok(())
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Alias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
