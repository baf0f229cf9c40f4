use std::num::NonZeroUsize;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_ALIAS_LENGTH: NonZeroUsize = match NonZeroUsize::new(6) {
    Some(length) => length,
    None => unreachable!(),
};

/// What an update does when no new alias is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyRenamePolicy {
    /// Fail with `InvalidInput`.
    #[default]
    Reject,
    /// Rename to a freshly generated alias.
    Generate,
}

/// Tunables for [`DirectoryService`](crate::DirectoryService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct DirectoryOptions {
    /// Length of generated aliases.
    #[builder(default = DEFAULT_ALIAS_LENGTH)]
    pub alias_length: NonZeroUsize,

    /// Extra attempts with a fresh candidate when a *generated* alias
    /// collides, on create and on a generated rename. Caller-supplied
    /// aliases are never retried.
    #[builder(default = 0)]
    pub generated_alias_retries: usize,

    #[builder(default)]
    pub empty_rename: EmptyRenamePolicy,

    /// Upper bound on a single store call, pool acquisition included, so it
    /// should not be shorter than the pool's acquire timeout. On expiry the
    /// call is dropped and the operation fails with `StoreUnavailable`.
    #[builder(default = Duration::from_secs(5))]
    pub store_timeout: Duration,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
