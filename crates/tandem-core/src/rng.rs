//! Seeded, reproducible random number generation.
//!
//! [`DeterministicRng`] wraps a ChaCha8 stream. Its output is a pure
//! function of the seed and the number of draws made so far: every `next_*`
//! method consumes exactly one 32-bit draw, so two instances constructed
//! from the same seed and driven through the same call sequence produce
//! identical values on every platform.
//!
//! Simulation code receives an explicit instance (see
//! [`DeterministicRng::with_stream`] for deriving per-frame streams). The
//! process-wide default in [`ambient`] exists only for utility call sites
//! outside the replayed simulation path.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::fixed::Fixed;

/// A deterministic pseudo-random generator.
///
/// # Examples
///
/// ```
/// use tandem_core::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// for _ in 0..100 {
///     assert_eq!(a.next_int(), b.next_int());
/// }
///
/// let c = a.clone();
/// assert_eq!(a.next_int_range(0, 10), c.clone().next_int_range(0, 10));
/// ```
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: ChaCha8Rng,
    seed: u64,
    stream: u64,
    draws: u64,
}

impl DeterministicRng {
    /// Create a generator on stream 0 of `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    /// Create a generator on an independent stream of `seed`.
    ///
    /// Distinct streams of the same seed do not overlap. The game state
    /// uses the frame number as the stream id so that per-frame randomness
    /// is recoverable from `(seed, frame)` alone.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self {
            inner,
            seed,
            stream,
            draws: 0,
        }
    }

    /// A fresh generator on `stream` of this generator's seed.
    ///
    /// The result does not depend on how many draws `self` has made, so a
    /// subsystem can be given its own stream without perturbing others.
    pub fn fork(&self, stream: u64) -> Self {
        Self::with_stream(self.seed, stream)
    }

    /// Reset to the state of a freshly constructed `new(seed)`.
    pub fn set_seed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// The seed this generator was constructed (or last reset) with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The stream id this generator draws from.
    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Number of draws made since construction.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Next raw 32-bit value.
    pub fn next_int(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    /// Uniform integer in `[min, max_exclusive)`.
    ///
    /// Uses a single multiply-shift reduction, so exactly one draw is
    /// consumed regardless of the range.
    ///
    /// # Panics
    ///
    /// Panics if `min >= max_exclusive`.
    pub fn next_int_range(&mut self, min: i32, max_exclusive: i32) -> i32 {
        assert!(
            min < max_exclusive,
            "next_int_range: empty range {min}..{max_exclusive}"
        );
        let span = (max_exclusive as i64 - min as i64) as u64;
        let offset = (self.next_int() as u64 * span) >> 32;
        (min as i64 + offset as i64) as i32
    }

    /// Uniform `f32` in `[0, 1)`.
    ///
    /// Built from the top 24 bits of one draw, so the value is exact and
    /// identical everywhere. Intended for presentation-side consumers;
    /// simulation code uses [`next_fixed`](Self::next_fixed).
    pub fn next_float(&mut self) -> f32 {
        (self.next_int() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform [`Fixed`] in `[0, 1)`.
    pub fn next_fixed(&mut self) -> Fixed {
        Fixed::from_raw((self.next_int() >> 16) as i32)
    }

    /// Fair coin flip.
    pub fn next_bool(&mut self) -> bool {
        self.next_int() >> 31 == 1
    }

    /// A uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_index(items.len());
        items.get(idx)
    }

    /// Return a shuffled copy of `items`.
    ///
    /// Fisher–Yates from the back; consumes exactly `len - 1` draws (zero
    /// for empty or single-element input).
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        self.shuffle_in_place(&mut out);
        out
    }

    /// Shuffle `items` in place. Same draw sequence as [`shuffle`](Self::shuffle).
    pub fn shuffle_in_place<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }

    fn next_index(&mut self, len: usize) -> usize {
        ((self.next_int() as u64 * len as u64) >> 32) as usize
    }
}

/// Process-wide default generator for non-simulation utilities.
///
/// Nothing in the lockstep path reads this: its state depends on every
/// caller in the process, so it cannot be reproduced by a replay.
pub mod ambient {
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

    use super::DeterministicRng;

    /// Seed used until [`set_global_seed`] is called.
    pub const DEFAULT_SEED: u64 = 0x7A4D_3E11;

    static GLOBAL: OnceLock<Mutex<DeterministicRng>> = OnceLock::new();

    fn cell() -> &'static Mutex<DeterministicRng> {
        GLOBAL.get_or_init(|| Mutex::new(DeterministicRng::new(DEFAULT_SEED)))
    }

    /// Reset the process-wide generator to `seed`.
    pub fn set_global_seed(seed: u64) {
        global_rng().set_seed(seed);
    }

    /// Lock and return the process-wide generator.
    pub fn global_rng() -> MutexGuard<'static, DeterministicRng> {
        cell().lock().unwrap_or_else(PoisonError::into_inner)
    }
}
