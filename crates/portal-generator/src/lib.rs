pub mod random;

pub use random::{generate, SeededRandom, ThreadRandom, ALPHABET};

use portal_core::Alias;
use std::num::NonZeroUsize;

/// Trait for generating candidate aliases.
///
/// Implementations are pure generators that don't interact with storage, and
/// their output is not guaranteed to be unique: the store's collision
/// detection decides whether a candidate can be used.
pub trait Generator: Send + Sync + 'static {
    /// Generates a candidate alias of exactly `length` symbols.
    fn generate(&self, length: NonZeroUsize) -> Alias;
}

impl<G: Generator + ?Sized> Generator for std::sync::Arc<G> {
    fn generate(&self, length: NonZeroUsize) -> Alias {
        (**self).generate(length)
    }
}
