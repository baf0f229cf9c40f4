//! HTTP surface of the alias directory.
//!
//! [`App::router`] builds the axum router over any
//! [`AliasDirectory`](portal_core::AliasDirectory) held in [`AppState`].

pub mod app;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use metrics::HttpMetrics;
pub use state::{AppState, LookupMode};
