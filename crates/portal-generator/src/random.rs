use crate::Generator;
use parking_lot::Mutex;
use portal_core::Alias;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;

/// The 36 symbols an alias is drawn from.
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws `length` symbols uniformly from [`ALPHABET`] using `rng`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: NonZeroUsize) -> Alias {
    let alias: String = (0..length.get())
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    Alias::new_unchecked(alias)
}

/// Generator backed by the calling thread's RNG.
///
/// Holds no state, so concurrent callers never contend on anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl Generator for ThreadRandom {
    fn generate(&self, length: NonZeroUsize) -> Alias {
        generate(&mut rand::rng(), length)
    }
}

/// Generator backed by a seeded [`StdRng`], for reproducible sequences.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Generator for SeededRandom {
    fn generate(&self, length: NonZeroUsize) -> Alias {
        generate(&mut *self.rng.lock(), length)
    }
}
