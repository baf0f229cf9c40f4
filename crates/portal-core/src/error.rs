use thiserror::Error;

/// Result type shared by the store and the directory service.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// The error vocabulary every backend and the service agree on.
///
/// Backend-native errors are translated into one of these variants at the
/// store boundary. `StoreUnavailable` and `Internal` deliberately carry no
/// detail: the full cause is logged where it happens and never handed to
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("alias already exists: {0}")]
    AliasExists(String),
    #[error("alias not found: {0}")]
    AliasNotFound(String),
    #[error("url not found for alias: {0}")]
    UrlNotFound(String),
    #[error("storage backend unavailable")]
    StoreUnavailable,
    #[error("internal error")]
    Internal,
}

impl DirectoryError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}
