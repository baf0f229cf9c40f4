use sqlx::pool::PoolOptions;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Bounds for a store's connection pool.
///
/// Callers wait for a free connection when the pool is exhausted, up to
/// `acquire_timeout`; after that the operation fails as unavailable.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PoolSettings {
    #[builder(default = 10)]
    pub max_connections: u32,
    #[builder(default = 0)]
    pub min_connections: u32,
    #[builder(default = Duration::from_secs(3))]
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PoolSettings {
    pub(crate) fn options<DB: sqlx::Database>(&self) -> PoolOptions<DB> {
        PoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
    }
}
