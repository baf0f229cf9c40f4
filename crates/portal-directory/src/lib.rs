//! Alias directory service.
//!
//! [`DirectoryService`] validates raw inputs, draws aliases from a
//! [`Generator`](portal_generator::Generator) when the caller supplies none,
//! and delegates persistence to a [`DirectoryStore`](portal_core::DirectoryStore).
//! Core types are re-exported from `portal_core`.

pub mod options;
pub mod service;

pub use options::{DirectoryOptions, EmptyRenamePolicy};
pub use portal_core::{AliasDirectory, CreateParams, Created, DirectoryError};
pub use service::DirectoryService;
