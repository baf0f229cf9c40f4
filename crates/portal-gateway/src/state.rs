use std::sync::Arc;

use portal_core::AliasDirectory;

use crate::metrics::HttpMetrics;

/// How `GET /{alias}` answers a successful lookup. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// 200 with `{"status":"OK","url":...}`.
    #[default]
    Json,
    /// 302 with the URL in `Location`.
    Redirect,
}

#[derive(Clone)]
pub struct AppState {
    directory: Arc<dyn AliasDirectory>,
    lookup_mode: LookupMode,
    metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn AliasDirectory>,
        lookup_mode: LookupMode,
        metrics: Arc<HttpMetrics>,
    ) -> Self {
        Self {
            directory,
            lookup_mode,
            metrics,
        }
    }

    pub fn directory(&self) -> &dyn AliasDirectory {
        self.directory.as_ref()
    }

    pub fn lookup_mode(&self) -> LookupMode {
        self.lookup_mode
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }
}
