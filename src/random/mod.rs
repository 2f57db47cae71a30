//! Deterministic, contention-free random number streams.
//!
//! The simulation never shares a generator between workers. Instead, every purpose that needs
//! randomness (placing individuals, moving them, exposing them) is named by a marker type declared
//! with [`define_rng!`], and a generator is derived on demand for each `(epoch, individual)` pair
//! from the run's base seed, the marker's name, the epoch and the individual's index.
//!
//! A worker therefore draws only from the streams of the individuals it owns, and the values it
//! draws do not depend on how the population was partitioned. The same base seed yields the same
//! simulation on one worker or on many.
mod macros;
mod sampling;

use std::marker::PhantomData;

pub use macros::define_rng;
pub use sampling::{sample_from_slice, sample_index};

use crate::hashing::{hash_str, hash_words};
use crate::rand::SeedableRng;

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

/// The family of generators for one [`RngId`] within one run.
#[derive(Copy, Clone)]
pub struct RngStreams<R: RngId> {
    seed: u64,
    _rng_id: PhantomData<R>,
}

impl<R: RngId> RngStreams<R> {
    /// Creates the streams for `R` under the run's `base_seed`.
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RngStreams {
            seed: base_seed.wrapping_add(hash_str(R::get_name())),
            _rng_id: PhantomData,
        }
    }

    /// The generator for individual `index` in `epoch`.
    #[must_use]
    pub fn get(&self, epoch: u32, index: usize) -> R::RngType {
        R::RngType::seed_from_u64(hash_words(&[self.seed, u64::from(epoch), index as u64]))
    }

    /// A generator not tied to an epoch or individual, for one-off setup draws.
    #[must_use]
    pub fn setup(&self) -> R::RngType {
        R::RngType::seed_from_u64(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::RngCore;

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn same_coordinates_same_stream() {
        let streams = RngStreams::<FooRng>::new(42);
        assert_eq!(
            streams.get(3, 17).next_u64(),
            RngStreams::<FooRng>::new(42).get(3, 17).next_u64()
        );
    }

    #[test]
    fn streams_differ_by_coordinate() {
        let streams = RngStreams::<FooRng>::new(42);
        let first = streams.get(0, 0).next_u64();
        assert_ne!(first, streams.get(1, 0).next_u64());
        assert_ne!(first, streams.get(0, 1).next_u64());
        assert_ne!(first, streams.setup().next_u64());
    }

    #[test]
    fn multiple_rng_types() {
        assert_ne!(
            RngStreams::<FooRng>::new(42).get(0, 0).next_u64(),
            RngStreams::<BarRng>::new(42).get(0, 0).next_u64()
        );
    }

    #[test]
    fn reset_seed() {
        let run_0 = RngStreams::<FooRng>::new(42).setup().next_u64();
        assert_eq!(run_0, RngStreams::<FooRng>::new(42).setup().next_u64());
        assert_ne!(run_0, RngStreams::<FooRng>::new(88).setup().next_u64());
    }
}
