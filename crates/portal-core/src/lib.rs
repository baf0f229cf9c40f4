//! Core types and traits for the Portal alias directory.
//!
//! This crate holds the contract shared by every layer: the [`Alias`] and
//! [`RecordId`] types, the [`DirectoryStore`] persistence trait, the
//! [`AliasDirectory`] operation trait and the [`DirectoryError`] vocabulary
//! that storage backends and the service agree on.

pub mod alias;
pub mod directory;
pub mod error;
pub mod store;

pub use alias::Alias;
pub use directory::{AliasDirectory, CreateParams, Created};
pub use error::{DirectoryError, Result};
pub use store::{DirectoryStore, RecordId};
